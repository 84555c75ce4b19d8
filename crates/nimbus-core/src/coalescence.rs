//! Stochastic coalescence building blocks.
//!
//! The all-or-nothing super-droplet coalescence scheme of
//! Shima et al. (2009, Q. J. R. Meteorol. Soc.): per substep, a random
//! non-overlapping pairing of the population is sampled, each candidate
//! pair coalesces with a probability up-scaled to represent all
//! $n(n-1)/2$ combinations, and multiplicities are re-booked so total
//! water volume is conserved exactly.
//!
//! Execution backends share these primitives and differ only in how the
//! per-pair rates are evaluated (serial loop, Rayon, GPU dispatch). The
//! pair sampling and the Monte-Carlo draws consume the ensemble RNG in a
//! fixed order, so two backends stepping from the same seed produce
//! bit-identical populations.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::droplet::Droplet;
use crate::kernel::CollisionKernel;
use crate::types::Real;

/// Random non-overlapping candidate pairs for one substep.
///
/// A Fisher–Yates shuffle of the indices, chunked in twos; with an odd
/// population one droplet sits the substep out.
pub fn sample_pairs<G: Rng>(n: usize, rng: &mut G) -> Vec<(usize, usize)> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

/// Up-scaling factor from the ⌊n/2⌋ sampled pairs to all $n(n-1)/2$
/// droplet combinations.
pub fn pair_upscale(n: usize) -> f64 {
    let pairs = (n / 2) as f64;
    if pairs == 0.0 {
        return 0.0;
    }
    n as f64 * (n as f64 - 1.0) / 2.0 / pairs
}

/// Expected number of coalescence events for one candidate pair over a
/// substep of length `dt` in a box of volume `volume`.
pub fn pair_probability<R: Real>(
    a: &Droplet<R>,
    b: &Droplet<R>,
    kernel: &CollisionKernel,
    eps: f64,
    upscale: f64,
    dt: f64,
    volume: f64,
) -> f64 {
    let xi_max = a.multiplicity.max(b.multiplicity) as f64;
    xi_max * kernel.rate(a.radius.as_f64(), b.radius.as_f64(), eps) * upscale * dt / volume
}

/// Draw the integer number of coalescence events from its expectation.
///
/// Always consumes exactly one uniform variate, so backends that
/// pre-compute the expectations keep the same RNG stream as the serial
/// loop.
pub fn draw_events<G: Rng>(expectation: f64, rng: &mut G) -> u64 {
    let whole = expectation.floor();
    let fraction = expectation - whole;
    whole as u64 + u64::from(rng.random::<f64>() < fraction)
}

/// Apply `gamma` coalescence events to the droplet pair `(i, j)`.
///
/// The higher-multiplicity super-droplet donates `gamma` physical
/// droplets to each member of the lower-multiplicity one; `gamma` is
/// capped so the donor multiplicity never goes negative. When the donor
/// is fully consumed, the merged population is split between both slots;
/// a slot left with zero multiplicity is dead and must be purged by the
/// caller before the next substep.
///
/// Returns `true` if a droplet died.
pub fn apply_coalescence<R: Real>(
    droplets: &mut [Droplet<R>],
    i: usize,
    j: usize,
    gamma: u64,
) -> bool {
    if gamma == 0 {
        return false;
    }
    assert!(i != j, "a droplet cannot coalesce with itself");

    let (donor, acceptor) = if droplets[i].multiplicity >= droplets[j].multiplicity {
        (i, j)
    } else {
        (j, i)
    };
    let xi_donor = droplets[donor].multiplicity;
    let xi_acceptor = droplets[acceptor].multiplicity;
    let gamma = gamma.min(xi_donor / xi_acceptor);

    let r_donor = droplets[donor].radius.as_f64();
    let r_acceptor = droplets[acceptor].radius.as_f64();
    let merged = (gamma as f64 * r_donor.powi(3) + r_acceptor.powi(3)).cbrt();

    if xi_donor > gamma * xi_acceptor {
        droplets[donor].multiplicity = xi_donor - gamma * xi_acceptor;
        droplets[acceptor].radius = R::from_f64(merged);
        false
    } else {
        // Donor fully consumed: split the merged super-droplet across
        // both slots to keep the sample size up.
        let half = xi_acceptor / 2;
        droplets[donor].radius = R::from_f64(merged);
        droplets[acceptor].radius = R::from_f64(merged);
        droplets[donor].multiplicity = half;
        droplets[acceptor].multiplicity = xi_acceptor - half;
        half == 0
    }
}

/// Remove droplets whose multiplicity dropped to zero.
pub fn purge_dead<R: Real>(droplets: &mut Vec<Droplet<R>>) {
    droplets.retain(|d| d.multiplicity > 0);
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn total_volume(droplets: &[Droplet<f64>]) -> f64 {
        droplets.iter().map(Droplet::total_volume).sum()
    }

    #[test]
    fn test_sampled_pairs_are_disjoint() {
        let mut rng = StdRng::seed_from_u64(3);
        let pairs = sample_pairs(101, &mut rng);
        assert_eq!(pairs.len(), 50);

        let mut seen = vec![false; 101];
        for &(i, j) in &pairs {
            assert!(!seen[i] && !seen[j], "index appears in two pairs");
            seen[i] = true;
            seen[j] = true;
        }
    }

    #[test]
    fn test_upscale_covers_all_combinations() {
        // Even population: n(n-1)/2 / (n/2) = n-1.
        assert_relative_eq!(pair_upscale(64), 63.0);
        // Odd population.
        assert_relative_eq!(pair_upscale(5), 2.0 * 5.0 / 2.0);
        // Degenerate populations sample no pairs.
        assert_eq!(pair_upscale(1), 0.0);
        assert_eq!(pair_upscale(0), 0.0);
    }

    #[test]
    fn test_draw_events_floor_and_fraction() {
        let mut rng = StdRng::seed_from_u64(11);
        // Certain part: expectation 3.0 always yields 3.
        for _ in 0..100 {
            assert_eq!(draw_events(3.0, &mut rng), 3);
        }
        // Fractional part: expectation 0.25 averages a quarter event.
        let n = 100_000;
        let total: u64 = (0..n).map(|_| draw_events(0.25, &mut rng)).sum();
        assert_relative_eq!(total as f64 / n as f64, 0.25, max_relative = 0.05);
    }

    #[test]
    fn test_coalescence_conserves_water_volume() {
        let mut droplets = vec![Droplet::new(20e-6_f64, 1000), Droplet::new(35e-6_f64, 300)];
        let before = total_volume(&droplets);

        let died = apply_coalescence(&mut droplets, 0, 1, 2);
        assert!(!died);
        assert_relative_eq!(total_volume(&droplets), before, max_relative = 1e-12);

        // Donor lost 2 physical droplets per acceptor droplet.
        assert_eq!(droplets[0].multiplicity, 1000 - 2 * 300);
        assert_eq!(droplets[1].multiplicity, 300);
        // Acceptor grew.
        assert!(droplets[1].radius > 35e-6);
        assert_relative_eq!(
            droplets[1].radius,
            (2.0 * 20e-6_f64.powi(3) + 35e-6_f64.powi(3)).cbrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_equal_multiplicities_split() {
        let mut droplets = vec![Droplet::new(10e-6_f64, 800), Droplet::new(12e-6_f64, 800)];
        let before = total_volume(&droplets);

        let died = apply_coalescence(&mut droplets, 0, 1, 1);
        assert!(!died);
        assert_relative_eq!(total_volume(&droplets), before, max_relative = 1e-12);
        assert_eq!(droplets[0].multiplicity + droplets[1].multiplicity, 800);
        assert_eq!(droplets[0].radius, droplets[1].radius);
    }

    #[test]
    fn test_gamma_capped_by_donor_supply() {
        // gamma asks for 10 donations but the donor can only cover 3.
        let mut droplets = vec![Droplet::new(20e-6_f64, 31), Droplet::new(25e-6_f64, 10)];
        let before = total_volume(&droplets);

        apply_coalescence(&mut droplets, 0, 1, 10);
        assert_eq!(droplets[0].multiplicity, 1);
        assert_relative_eq!(total_volume(&droplets), before, max_relative = 1e-12);
    }

    #[test]
    fn test_unit_multiplicity_pair_leaves_one_survivor() {
        let mut droplets = vec![Droplet::new(10e-6_f64, 1), Droplet::new(12e-6_f64, 1)];
        let before = total_volume(&droplets);

        let died = apply_coalescence(&mut droplets, 0, 1, 1);
        assert!(died);
        purge_dead(&mut droplets);
        assert_eq!(droplets.len(), 1);
        assert_eq!(droplets[0].multiplicity, 1);
        assert_relative_eq!(total_volume(&droplets), before, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_events_is_a_no_op() {
        let mut droplets = vec![Droplet::new(10e-6_f64, 5), Droplet::new(12e-6_f64, 7)];
        let snapshot = droplets.clone();
        assert!(!apply_coalescence(&mut droplets, 0, 1, 0));
        assert_eq!(droplets, snapshot);
    }
}
