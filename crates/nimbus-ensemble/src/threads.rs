//! Shared-memory parallel backend using Rayon.
//!
//! The candidate-pair expectations are evaluated in parallel — pairs are
//! non-overlapping, so each one reads a disjoint slice of the pre-substep
//! population — while the pair sampling and the Monte-Carlo application
//! stay sequential on the ensemble RNG. The substep therefore joins all
//! workers before returning, and a threaded ensemble stepping from the
//! same seed reproduces the serial backend bit for bit.

use rayon::prelude::*;

use nimbus_core::coalescence::pair_probability;
use nimbus_core::types::{Real, ZeroDimConfig};

use crate::ensemble::{BackendTag, EnsembleError, ParticleEnsemble};
use crate::state::ZeroDimState;

/// Rayon-parallel super-droplet ensemble.
pub struct ThreadsEnsemble<R: Real> {
    state: ZeroDimState<R>,
}

impl<R: Real> ThreadsEnsemble<R> {
    /// Initialise a zero-dimensional population from the configuration.
    ///
    /// # Panics
    /// Panics if the configuration violates its physical-range invariants.
    pub fn new(config: ZeroDimConfig) -> Self {
        log::debug!(
            "threads backend running on {} Rayon threads",
            rayon::current_num_threads()
        );
        Self {
            state: ZeroDimState::new(config),
        }
    }
}

impl<R: Real> ParticleEnsemble<R> for ThreadsEnsemble<R> {
    fn backend(&self) -> BackendTag {
        BackendTag::Threads
    }

    fn step_coalescence(&mut self, dt: R, eps: R) -> Result<(), EnsembleError> {
        let dt = dt.as_f64();
        let eps = eps.as_f64();
        let Some((pairs, upscale)) = self.state.begin_substep(dt, eps) else {
            return Ok(());
        };

        let kernel = self.state.config.kernel;
        let volume = self.state.config.volume.value();
        let droplets = &self.state.droplets;
        let expectations: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| {
                pair_probability(&droplets[i], &droplets[j], &kernel, eps, upscale, dt, volume)
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
