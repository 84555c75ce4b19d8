//! Super-droplet state and initial-population sampling.

use rand::Rng;

use crate::types::{Real, ZeroDimConfig};

/// A single super-droplet: one simulated particle standing in for
/// `multiplicity` physical droplets of identical radius.
///
/// Invariants: `radius >= 0` always; `multiplicity > 0` while the droplet
/// is part of a live population (a coalescence substep may zero the
/// multiplicity transiently, after which the droplet is purged).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Droplet<R: Real> {
    /// Wet radius (m).
    pub radius: R,
    /// Number of physical droplets this super-droplet represents.
    pub multiplicity: u64,
}

impl<R: Real> Droplet<R> {
    /// Create a super-droplet.
    ///
    /// # Panics
    /// Panics if the radius is negative or the multiplicity is zero.
    pub fn new(radius: R, multiplicity: u64) -> Self {
        assert!(
            radius >= R::zero(),
            "droplet radius must be non-negative (got {radius})"
        );
        assert!(multiplicity > 0, "droplet multiplicity must be positive");
        Self {
            radius,
            multiplicity,
        }
    }

    /// Volume of one physical droplet (m³).
    pub fn volume(&self) -> f64 {
        sphere_volume(self.radius.as_f64())
    }

    /// Total water volume carried by this super-droplet (m³).
    pub fn total_volume(&self) -> f64 {
        self.multiplicity as f64 * self.volume()
    }
}

/// Volume of a sphere of the given radius.
pub fn sphere_volume(radius: f64) -> f64 {
    4.0 / 3.0 * std::f64::consts::PI * radius.powi(3)
}

/// Sample the initial super-droplet population for a zero-dimensional box.
///
/// Radii are drawn from the configured exponential-in-volume spectrum by
/// inverse-CDF sampling; every super-droplet receives the same multiplicity
/// `N₀ V / n_sd` so the sampled population carries the configured physical
/// droplet count.
///
/// # Panics
/// Panics if the configuration violates its physical-range invariants.
pub fn init_population<R: Real, G: Rng>(config: &ZeroDimConfig, rng: &mut G) -> Vec<Droplet<R>> {
    config.validate();

    let n_sd = config.superdroplet_count();
    let mean_volume = sphere_volume(config.init.mean_radius.value());
    let multiplicity = (config.init.number_concentration.value() * config.volume.value()
        / n_sd as f64)
        .round()
        .max(1.0) as u64;

    (0..n_sd)
        .map(|_| {
            // v = -v̄ ln(1-u); 1-u is uniform on (0, 1] so the log is finite.
            let u: f64 = rng.random();
            let volume = -mean_volume * (1.0 - u).ln();
            let radius = (volume / (4.0 / 3.0 * std::f64::consts::PI)).cbrt();
            Droplet::new(R::from_f64(radius), multiplicity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::units::Metres;

    use super::*;

    #[test]
    fn test_sphere_volume() {
        assert_relative_eq!(
            sphere_volume(1e-6),
            4.0 / 3.0 * std::f64::consts::PI * 1e-18,
            max_relative = 1e-15
        );
    }

    #[test]
    #[should_panic(expected = "multiplicity must be positive")]
    fn test_zero_multiplicity_rejected() {
        let _ = Droplet::new(1e-6_f64, 0);
    }

    #[test]
    fn test_population_count_and_weighting() {
        let config = ZeroDimConfig::with_sd_conc_mean(128.0);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let droplets: Vec<Droplet<f64>> = init_population(&config, &mut rng);

        assert_eq!(droplets.len(), 128);
        let total: u64 = droplets.iter().map(|d| d.multiplicity).sum();
        let expected = config.init.number_concentration.value() * config.volume.value();
        // Equal multiplicities, rounded once.
        assert_relative_eq!(total as f64, expected, max_relative = 1e-2);
    }

    #[test]
    fn test_population_mean_volume() {
        // The sample mean of an exponential volume spectrum converges to
        // the configured mean volume.
        let mut config = ZeroDimConfig::with_sd_conc_mean(8192.0);
        config.init.mean_radius = Metres::from_micrometres(30.531);
        let mut rng = StdRng::seed_from_u64(7);
        let droplets: Vec<Droplet<f64>> = init_population(&config, &mut rng);

        let mean_volume: f64 =
            droplets.iter().map(Droplet::volume).sum::<f64>() / droplets.len() as f64;
        assert_relative_eq!(
            mean_volume,
            sphere_volume(config.init.mean_radius.value()),
            max_relative = 0.05
        );
    }

    #[test]
    fn test_population_is_reproducible() {
        let config = ZeroDimConfig::with_sd_conc_mean(64.0);
        let mut rng_a = StdRng::seed_from_u64(config.seed);
        let mut rng_b = StdRng::seed_from_u64(config.seed);
        let a: Vec<Droplet<f64>> = init_population(&config, &mut rng_a);
        let b: Vec<Droplet<f64>> = init_population(&config, &mut rng_b);
        assert_eq!(a, b);
    }
}
