//! Single-threaded reference backend.
//!
//! The simplest implementation of the ensemble contract: plain loops over
//! an array-of-structures droplet population. Every other backend is
//! validated against this one — with the same seed they must produce
//! bit-identical populations.

use nimbus_core::coalescence::pair_probability;
use nimbus_core::types::{Real, ZeroDimConfig};

use crate::ensemble::{BackendTag, EnsembleError, ParticleEnsemble};
use crate::state::ZeroDimState;

/// Serial super-droplet ensemble.
pub struct SerialEnsemble<R: Real> {
    state: ZeroDimState<R>,
}

impl<R: Real> SerialEnsemble<R> {
    /// Initialise a zero-dimensional population from the configuration.
    ///
    /// # Panics
    /// Panics if the configuration violates its physical-range invariants.
    pub fn new(config: ZeroDimConfig) -> Self {
        Self {
            state: ZeroDimState::new(config),
        }
    }
}

impl<R: Real> ParticleEnsemble<R> for SerialEnsemble<R> {
    fn backend(&self) -> BackendTag {
        BackendTag::Serial
    }

    fn step_coalescence(&mut self, dt: R, eps: R) -> Result<(), EnsembleError> {
        let dt = dt.as_f64();
        let eps = eps.as_f64();
        let Some((pairs, upscale)) = self.state.begin_substep(dt, eps) else {
            return Ok(());
        };

        let kernel = self.state.config.kernel;
        let volume = self.state.config.volume.value();
        let expectations: Vec<f64> = pairs
            .iter()
            .map(|&(i, j)| {
                pair_probability(
                    &self.state.droplets[i],
                    &self.state.droplets[j],
                    &kernel,
                    eps,
                    upscale,
                    dt,
                    volume,
                )
            })
            .collect();

        self.state.finish_substep(&pairs, &expectations);
        Ok(())
    }

    fn superdroplet_count(&self) -> usize {
        self.state.droplets.len()
    }

    fn total_multiplicity(&self) -> u64 {
        self.state.total_multiplicity()
    }

    fn radius_moment(&self, k: u32) -> f64 {
        self.state.radius_moment(k)
    }
}
