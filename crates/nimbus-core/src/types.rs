//! Precision parameter and ensemble configuration.
//!
//! Ensembles are generic over a floating-point precision [`Real`]; the
//! configuration itself is plain `f64` since it only crosses the boundary
//! once, at construction.

use std::fmt;

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::kernel::CollisionKernel;
use crate::units::{CubicMetres, Metres, PerCubicMetre};

/// Floating-point precision of the droplet state.
///
/// Implemented for `f32` and `f64`. Kernel evaluation always widens to
/// `f64`; the precision parameter only controls how the per-droplet state
/// is stored, which dominates memory traffic for large populations.
pub trait Real: Float + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Narrowing conversion from `f64`.
    fn from_f64(x: f64) -> Self;
    /// Widening conversion to `f64`.
    fn as_f64(self) -> f64;
}

impl Real for f32 {
    fn from_f64(x: f64) -> Self {
        x as f32
    }
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Real for f64 {
    fn from_f64(x: f64) -> Self {
        x
    }
    fn as_f64(self) -> f64 {
        self
    }
}

/// Initial droplet population: an exponential distribution in droplet
/// volume, $n(v) = (N_0/\bar{v}) \exp(-v/\bar{v})$, the standard initial
/// condition for box-model coalescence studies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitSpectrum {
    /// Total physical droplet number concentration $N_0$.
    pub number_concentration: PerCubicMetre,
    /// Mean volume-equivalent radius $\bar{r} = (3\bar{v}/4\pi)^{1/3}$.
    pub mean_radius: Metres,
}

impl Default for InitSpectrum {
    fn default() -> Self {
        Self {
            // 2²³ droplets per m³ with r̄ ≈ 30.5 µm, the common box-model
            // reference population.
            number_concentration: PerCubicMetre::new(8_388_608.0),
            mean_radius: Metres::from_micrometres(30.531),
        }
    }
}

/// Configuration of a zero-dimensional (single well-mixed volume)
/// super-droplet ensemble.
///
/// `sd_conc_mean` is the only scalar the construction surface requires;
/// the remaining fields have physically sensible defaults and are fixed
/// for the lifetime of the ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroDimConfig {
    /// Mean super-droplet concentration (super-droplets per m³). Together
    /// with `volume` this sets the super-droplet count.
    pub sd_conc_mean: f64,
    /// Volume of the well-mixed box.
    #[serde(default = "default_volume")]
    pub volume: CubicMetres,
    /// Initial droplet spectrum.
    #[serde(default)]
    pub init: InitSpectrum,
    /// Collision kernel.
    #[serde(default)]
    pub kernel: CollisionKernel,
    /// RNG seed. A fixed seed makes the stepping reproducible across runs
    /// and across the serial and threaded backends.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_volume() -> CubicMetres {
    CubicMetres::new(1.0)
}

fn default_seed() -> u64 {
    44
}

impl ZeroDimConfig {
    /// Default configuration for a given mean super-droplet concentration.
    ///
    /// # Panics
    /// Panics if `sd_conc_mean` is not positive: an unphysical population
    /// invalidates the whole run, so this fails fast rather than coercing.
    pub fn with_sd_conc_mean(sd_conc_mean: f64) -> Self {
        assert!(
            sd_conc_mean > 0.0,
            "mean super-droplet concentration must be positive (got {sd_conc_mean:e})"
        );
        Self {
            sd_conc_mean,
            volume: default_volume(),
            init: InitSpectrum::default(),
            kernel: CollisionKernel::default(),
            seed: default_seed(),
        }
    }

    /// Expected number of super-droplets in the box.
    pub fn superdroplet_count(&self) -> usize {
        (self.sd_conc_mean * self.volume.value()).round() as usize
    }

    /// Check the physical-range invariants.
    ///
    /// # Panics
    /// Panics on any non-positive concentration, volume, or radius. These
    /// are caller contract violations, not recoverable conditions.
    pub fn validate(&self) {
        assert!(
            self.sd_conc_mean > 0.0,
            "mean super-droplet concentration must be positive (got {:e})",
            self.sd_conc_mean
        );
        assert!(
            self.volume.value() > 0.0,
            "box volume must be positive (got {:e})",
            self.volume.value()
        );
        assert!(
            self.init.number_concentration.value() > 0.0,
            "droplet number concentration must be positive (got {:e})",
            self.init.number_concentration.value()
        );
        assert!(
            self.init.mean_radius.value() > 0.0,
            "mean radius must be positive (got {:e})",
            self.init.mean_radius.value()
        );
        assert!(
            self.superdroplet_count() >= 2,
            "sd_conc_mean * volume must yield at least two super-droplets (got {})",
            self.superdroplet_count()
        );
    }
}
