//! Ensemble construction.
//!
//! The factory is the only construction surface: callers name a
//! [`BackendTag`] and receive the matching ensemble behind the
//! [`ParticleEnsemble`] trait, never a concrete backend type. The
//! returned box is exclusively owned by the caller; dropping it releases
//! all droplet state.

use nimbus_core::types::{Real, ZeroDimConfig};

use crate::ensemble::{BackendTag, EnsembleError, ParticleEnsemble};
use crate::serial::SerialEnsemble;

/// Construct a zero-dimensional ensemble with default physics for the
/// given mean super-droplet concentration (super-droplets per m³).
///
/// Requesting a backend whose cargo feature was not compiled in returns
/// [`EnsembleError::BackendDisabled`]; there is no fallback.
///
/// # Panics
/// Panics if `sd_conc_mean` is not positive.
pub fn create_ensemble<R: Real>(
    backend: BackendTag,
    sd_conc_mean: f64,
) -> Result<Box<dyn ParticleEnsemble<R>>, EnsembleError> {
    create_ensemble_with(backend, ZeroDimConfig::with_sd_conc_mean(sd_conc_mean))
}

/// Construct a zero-dimensional ensemble from a full configuration.
///
/// # Panics
/// Panics if the configuration violates its physical-range invariants.
pub fn create_ensemble_with<R: Real>(
    backend: BackendTag,
    config: ZeroDimConfig,
) -> Result<Box<dyn ParticleEnsemble<R>>, EnsembleError> {
    match backend {
        BackendTag::Serial => Ok(Box::new(SerialEnsemble::new(config))),

        #[cfg(feature = "threads")]
        BackendTag::Threads => Ok(Box::new(crate::threads::ThreadsEnsemble::new(config))),

        #[cfg(feature = "gpu")]
        BackendTag::Gpu => Ok(Box::new(crate::gpu::GpuEnsemble::new_blocking(config)?)),

        #[allow(unreachable_patterns)]
        disabled => Err(EnsembleError::BackendDisabled {
            backend: disabled,
            feature: disabled
                .feature()
                .expect("ungated backends are always constructible"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_requested_backend() {
        let ensemble = create_ensemble::<f64>(BackendTag::Serial, 64.0).unwrap();
        assert_eq!(ensemble.backend(), BackendTag::Serial);
        assert_eq!(ensemble.superdroplet_count(), 64);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn test_factory_builds_threads_backend() {
        let ensemble = create_ensemble::<f64>(BackendTag::Threads, 64.0).unwrap();
        assert_eq!(ensemble.backend(), BackendTag::Threads);
    }

    #[cfg(not(feature = "threads"))]
    #[test]
    fn test_disabled_threads_backend_is_an_error() {
        let result = create_ensemble::<f64>(BackendTag::Threads, 64.0);
        assert!(matches!(
            result,
            Err(EnsembleError::BackendDisabled { feature: "threads", .. })
        ));
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn test_disabled_gpu_backend_is_an_error() {
        let result = create_ensemble::<f64>(BackendTag::Gpu, 64.0);
        assert!(matches!(
            result,
            Err(EnsembleError::BackendDisabled { feature: "gpu", .. })
        ));
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_non_positive_concentration_panics() {
        let _ = create_ensemble::<f64>(BackendTag::Serial, -1.0);
    }

    #[test]
    fn test_single_precision_ensembles() {
        let mut ensemble = create_ensemble::<f32>(BackendTag::Serial, 64.0).unwrap();
        ensemble.step_coalescence(1.0, 0.0).unwrap();
        assert!(ensemble.superdroplet_count() > 0);
    }
}
