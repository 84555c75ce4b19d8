//! Collision kernels and terminal fall speed.
//!
//! A collision kernel $K(r_1, r_2)$ (m³ s⁻¹) gives the volume swept per
//! unit time within which a pair of droplets collides. Two kernels are
//! provided: the analytically solvable Golovin kernel used to validate
//! box-model runs, and the geometric (hydrodynamic) kernel used for
//! physical simulations, optionally corrected for turbulence with the
//! Wang et al. (2009) enhancement table.

use serde::{Deserialize, Serialize};

use crate::droplet::sphere_volume;
use crate::enhancement::collision_enhancement;

/// Collision kernel selection, fixed per ensemble.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollisionKernel {
    /// Golovin (1963) additive kernel $K = b\,(v_1 + v_2)$.
    ///
    /// Physically crude, but the Smoluchowski equation has a closed-form
    /// solution for it, which makes it the standard verification kernel.
    Golovin {
        /// Kernel coefficient $b$ (s⁻¹).
        b: f64,
    },
    /// Geometric sweep-out kernel
    /// $K = \pi (r_1 + r_2)^2 \, |v_t(r_1) - v_t(r_2)|$,
    /// multiplied by the turbulent enhancement factor when the dissipation
    /// rate is non-zero.
    Hydrodynamic,
}

impl Default for CollisionKernel {
    fn default() -> Self {
        CollisionKernel::Hydrodynamic
    }
}

impl CollisionKernel {
    /// Kernel value for a droplet pair (m³ s⁻¹).
    ///
    /// # Arguments
    /// * `r1`, `r2` — Droplet radii (m), both positive.
    /// * `eps` — Turbulent kinetic-energy dissipation rate (m²/s³).
    ///
    /// # Panics
    /// Panics on non-positive radii or a negative dissipation rate.
    pub fn rate(&self, r1: f64, r2: f64, eps: f64) -> f64 {
        assert!(
            r1 > 0.0 && r2 > 0.0,
            "droplet radii must be positive (got {r1:e}, {r2:e})"
        );
        assert!(
            eps >= 0.0,
            "dissipation rate must be non-negative (got {eps:e})"
        );

        match *self {
            CollisionKernel::Golovin { b } => b * (sphere_volume(r1) + sphere_volume(r2)),
            CollisionKernel::Hydrodynamic => {
                let sum = r1 + r2;
                let dv = (terminal_velocity(r1) - terminal_velocity(r2)).abs();
                let geometric = std::f64::consts::PI * sum * sum * dv;
                if eps > 0.0 {
                    geometric * collision_enhancement(r1, r2, eps)
                } else {
                    geometric
                }
            }
        }
    }
}

/// Terminal fall speed (m s⁻¹) of a droplet of radius `radius` (m).
///
/// Three-regime approximation after Rogers & Yau (1989): Stokes drag
/// $v = k_1 r^2$ below 40 µm, the linear regime $v = k_2 r$ up to 0.6 mm,
/// and $v = k_3 \sqrt{r}$ for raindrops beyond.
///
/// # Panics
/// Panics on a negative radius.
pub fn terminal_velocity(radius: f64) -> f64 {
    assert!(radius >= 0.0, "radius must be non-negative (got {radius:e})");

    const K1: f64 = 1.19e8; // m⁻¹ s⁻¹
    const K2: f64 = 8e3; // s⁻¹
    const K3: f64 = 201.0; // m^(1/2) s⁻¹

    if radius < 40e-6 {
        K1 * radius * radius
    } else if radius < 600e-6 {
        K2 * radius
    } else {
        K3 * radius.sqrt()
    }
}
