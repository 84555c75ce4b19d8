//! Minimal dimensional scalars for the configuration boundary.
//!
//! The core math works on plain SI scalars (radii in metres, dissipation
//! rate in m²/s³) and trusts its callers to supply them consistently. A
//! full dimensional-analysis layer is an external collaborator; these thin
//! newtypes are the always-present stand-in used where host code hands
//! physical quantities across the crate boundary, so call sites stay
//! readable without dragging in a unit-checking system.

use serde::{Deserialize, Serialize};

macro_rules! dimensional_scalar {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(f64);

        impl $name {
            /// Wrap a value already expressed in the SI base unit.
            pub fn new(value: f64) -> Self {
                Self(value)
            }

            /// The value in the SI base unit.
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

dimensional_scalar! {
    /// A length in metres.
    Metres
}

dimensional_scalar! {
    /// A duration in seconds.
    Seconds
}

dimensional_scalar! {
    /// A volume in cubic metres.
    CubicMetres
}

dimensional_scalar! {
    /// A number concentration in inverse cubic metres.
    PerCubicMetre
}

dimensional_scalar! {
    /// Turbulent kinetic-energy dissipation rate in m²/s³.
    DissipationRate
}

impl Metres {
    /// Construct from micrometres, the natural scale for cloud droplets.
    pub fn from_micrometres(um: f64) -> Self {
        Self(um * 1e-6)
    }

    /// The value in micrometres.
    pub fn to_micrometres(self) -> f64 {
        self.0 * 1e6
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_micrometre_round_trip() {
        let r = Metres::from_micrometres(30.531);
        assert_relative_eq!(r.value(), 30.531e-6);
        assert_relative_eq!(r.to_micrometres(), 30.531);
    }

    #[test]
    fn test_transparent_wrappers() {
        assert_eq!(Seconds::new(1.0).value(), 1.0);
        assert_eq!(CubicMetres::new(1e-6).value(), 1e-6);
        assert_eq!(DissipationRate::new(0.04).value(), 0.04);
        assert_eq!(PerCubicMetre::new(64e6).value(), 64e6);
    }
}
