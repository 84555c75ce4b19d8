//! Particle-ensemble trait and backend identification.
//!
//! The [`ParticleEnsemble`] trait is the capability contract every
//! backend-specific ensemble implements, so that host simulation code can
//! hold and advance a droplet population without naming the execution
//! strategy. Concrete ensembles are constructed exclusively through
//! [`crate::factory::create_ensemble`].

use std::fmt;

use thiserror::Error;

use nimbus_core::types::Real;

/// The execution strategy of an ensemble. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendTag {
    /// Single-threaded reference backend.
    Serial,
    /// Shared-memory parallel backend (Rayon).
    Threads,
    /// Accelerator-offload backend (wgpu).
    Gpu,
}

impl BackendTag {
    /// The cargo feature that compiles this backend in, if it is gated.
    pub fn feature(self) -> Option<&'static str> {
        match self {
            BackendTag::Serial => None,
            BackendTag::Threads => Some("threads"),
            BackendTag::Gpu => Some("gpu"),
        }
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendTag::Serial => "serial",
            BackendTag::Threads => "threads",
            BackendTag::Gpu => "gpu",
        };
        f.write_str(name)
    }
}

/// Errors originating from ensembles and the factory.
///
/// Invalid physical inputs are *not* represented here — those are caller
/// contract violations and panic immediately. These variants cover the
/// build/runtime environment: a backend left out of the build, an
/// operation a placeholder backend has not implemented, and device
/// failures on the accelerator path.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// The requested backend was not compiled into this build. Enable the
    /// named cargo feature; there is no runtime fallback.
    #[error("backend `{backend}` was not enabled at build time (missing cargo feature `{feature}`)")]
    BackendDisabled {
        backend: BackendTag,
        feature: &'static str,
    },

    /// The backend is built but has not implemented this operation.
    /// Deliberately loud: a silent no-op would yield physically wrong
    /// results with no signal.
    #[error("operation `{operation}` is not implemented for the `{backend}` backend")]
    Unsupported {
        backend: BackendTag,
        operation: &'static str,
    },

    /// Device-level failure on the accelerator backend.
    #[error("device error: {0}")]
    Device(String),
}

/// Capability contract of a backend-specific super-droplet ensemble.
///
/// An ensemble exclusively owns its droplet population and RNG state;
/// nothing is shared between ensembles, so any number of them can coexist
/// in one process (including across different backends). All operations
/// run to completion synchronously — parallel backends join their workers
/// before returning.
pub trait ParticleEnsemble<R: Real>: Send {
    /// Which backend this ensemble executes on.
    fn backend(&self) -> BackendTag;

    /// Advance the population by one collision–coalescence substep of
    /// length `dt` (s) under the ambient turbulent kinetic-energy
    /// dissipation rate `eps` (m²/s³).
    ///
    /// # Panics
    /// Panics on a negative `dt` or `eps` — unphysical inputs invalidate
    /// the run and fail fast.
    fn step_coalescence(&mut self, dt: R, eps: R) -> Result<(), EnsembleError>;

    /// Advance condensational growth over `dt` (s) under the given
    /// ambient supersaturation.
    ///
    /// Reserved entry point for the condensation scheme. No backend
    /// implements it yet; the default refuses loudly instead of silently
    /// skipping the process.
    fn step_condensation(&mut self, dt: R, supersaturation: R) -> Result<(), EnsembleError> {
        // Default: not supported. Implementations override this.
        let _ = (dt, supersaturation);
        Err(EnsembleError::Unsupported {
            backend: self.backend(),
            operation: "step_condensation",
        })
    }

    /// Number of live super-droplets.
    fn superdroplet_count(&self) -> usize;

    /// Total number of physical droplets represented, $\sum_i \xi_i$.
    fn total_multiplicity(&self) -> u64;

    /// The k-th radius moment of the physical population,
    /// $\sum_i \xi_i r_i^k$ (mᵏ). Moment 0 is the physical droplet
    /// count; moment 3 is proportional to the total water volume and is
    /// conserved exactly by coalescence.
    fn radius_moment(&self, k: u32) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_tag_display() {
        assert_eq!(BackendTag::Serial.to_string(), "serial");
        assert_eq!(BackendTag::Threads.to_string(), "threads");
        assert_eq!(BackendTag::Gpu.to_string(), "gpu");
    }

    #[test]
    fn test_error_messages_name_the_backend() {
        let err = EnsembleError::BackendDisabled {
            backend: BackendTag::Gpu,
            feature: "gpu",
        };
        let message = err.to_string();
        assert!(message.contains("`gpu`"), "unexpected message: {message}");
        assert!(message.contains("feature"), "unexpected message: {message}");

        let err = EnsembleError::Unsupported {
            backend: BackendTag::Gpu,
            operation: "step_condensation",
        };
        assert!(err.to_string().contains("step_condensation"));
    }
}
