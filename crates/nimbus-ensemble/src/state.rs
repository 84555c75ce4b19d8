//! Internal ensemble state shared by the backend implementations.
//!
//! Crate-private on purpose: the droplet vector, RNG and configuration
//! form the opaque block of state behind the [`crate::ParticleEnsemble`]
//! information-hiding boundary. Callers only ever touch it through trait
//! operations.

use rand::rngs::StdRng;
use rand::SeedableRng;

use nimbus_core::coalescence::{self, purge_dead};
use nimbus_core::droplet::{init_population, Droplet};
use nimbus_core::types::{Real, ZeroDimConfig};

/// Droplet population, configuration and RNG of one zero-dimensional
/// ensemble. Exclusively owned by exactly one backend ensemble.
pub(crate) struct ZeroDimState<R: Real> {
    pub(crate) droplets: Vec<Droplet<R>>,
    pub(crate) config: ZeroDimConfig,
    pub(crate) rng: StdRng,
}

impl<R: Real> ZeroDimState<R> {
    /// Initialise the population from the configuration.
    ///
    /// # Panics
    /// Panics if the configuration violates its physical-range invariants.
    pub(crate) fn new(config: ZeroDimConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let droplets = init_population(&config, &mut rng);
        log::debug!(
            "initialised 0-D ensemble: {} super-droplets in {:e} m³",
            droplets.len(),
            config.volume.value()
        );
        Self {
            droplets,
            config,
            rng,
        }
    }

    /// Validate step inputs and prepare one substep: sample the candidate
    /// pairs and the up-scaling factor. Returns `None` when the
    /// population is too small to collide.
    pub(crate) fn begin_substep(&mut self, dt: f64, eps: f64) -> Option<(Vec<(usize, usize)>, f64)> {
        assert!(dt >= 0.0, "time step must be non-negative (got {dt:e})");
        assert!(
            eps >= 0.0,
            "dissipation rate must be non-negative (got {eps:e})"
        );

        let n = self.droplets.len();
        if n < 2 {
            return None;
        }
        let pairs = coalescence::sample_pairs(n, &mut self.rng);
        let upscale = coalescence::pair_upscale(n);
        Some((pairs, upscale))
    }

    /// Draw and apply the coalescence events for pre-computed pair
    /// expectations, then purge dead droplets. The draws consume the RNG
    /// in pair order regardless of how the expectations were evaluated,
    /// which keeps all backends on one stream.
    pub(crate) fn finish_substep(&mut self, pairs: &[(usize, usize)], expectations: &[f64]) {
        let mut any_died = false;
        for (&(i, j), &expectation) in pairs.iter().zip(expectations) {
            let gamma = coalescence::draw_events(expectation, &mut self.rng);
            if gamma > 0 {
                any_died |= coalescence::apply_coalescence(&mut self.droplets, i, j, gamma);
            }
        }
        if any_died {
            purge_dead(&mut self.droplets);
        }
    }

    pub(crate) fn total_multiplicity(&self) -> u64 {
        self.droplets.iter().map(|d| d.multiplicity).sum()
    }

    pub(crate) fn radius_moment(&self, k: u32) -> f64 {
        self.droplets
            .iter()
            .map(|d| d.multiplicity as f64 * d.radius.as_f64().powi(k as i32))
            .sum()
    }
}
