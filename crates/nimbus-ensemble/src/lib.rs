//! # Nimbus Ensemble
//!
//! Backend abstraction for super-droplet ensembles. This crate provides a
//! [`ParticleEnsemble`](ensemble::ParticleEnsemble) trait that isolates
//! host simulation code from the execution strategy of the droplet
//! population, and a [`create_ensemble`](factory::create_ensemble) factory
//! that is the only way callers obtain one.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Status |
//! |---------|-------------|--------|
//! | Serial | always built | Implemented |
//! | Threads (Rayon) | `threads` (default) | Implemented |
//! | GPU (wgpu) | `gpu` | Implemented (rate evaluation on device) |
//!
//! Requesting a backend whose feature was not compiled in is an
//! [`EnsembleError::BackendDisabled`](ensemble::EnsembleError) — never a
//! silent fallback to another backend.

pub mod ensemble;
pub mod factory;
pub mod serial;

mod state;

#[cfg(feature = "threads")]
pub mod threads;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use ensemble::{BackendTag, EnsembleError, ParticleEnsemble};
pub use factory::{create_ensemble, create_ensemble_with};
pub use serial::SerialEnsemble;

#[cfg(feature = "threads")]
pub use threads::ThreadsEnsemble;

#[cfg(feature = "gpu")]
pub use gpu::GpuEnsemble;
