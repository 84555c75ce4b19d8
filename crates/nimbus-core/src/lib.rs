//! # Nimbus Core
//!
//! The physics backbone of the Nimbus framework. This crate implements the
//! droplet-scale microphysics of a Lagrangian (super-droplet) cloud model:
//! the data model for physically weighted super-droplets, the collision
//! kernels with the turbulence-enhanced collision efficiency of
//! Wang et al. (2009), and the stochastic coalescence primitives shared by
//! every execution backend.
//!
//! ## Architecture
//!
//! Backend-specific ensemble types live in `nimbus-ensemble`; this crate is
//! deliberately execution-agnostic so the same droplet physics can be driven
//! from a serial loop, a Rayon thread pool, or a GPU dispatch.
//!
//! ## Modules
//!
//! - [`types`] — Precision parameter and ensemble configuration.
//! - [`units`] — Minimal dimensional scalars for the configuration boundary.
//! - [`droplet`] — Super-droplet state and initial-population sampling.
//! - [`kernel`] — Collision kernels and terminal fall speed.
//! - [`enhancement`] — Turbulence-enhanced collision efficiency table.
//! - [`coalescence`] — Stochastic coalescence building blocks.

pub mod coalescence;
pub mod droplet;
pub mod enhancement;
pub mod kernel;
pub mod types;
pub mod units;
