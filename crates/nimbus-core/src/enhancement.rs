//! Turbulence-enhanced collision efficiency.
//!
//! Tabulated enhancement factors from:
//! L.-P. Wang, O. Ayala, B. Rosa, W. W. Grabowski, *Turbulent collision
//! efficiency of heavy particles relevant to cloud droplets*,
//! Atmos. Sci. Lett. (2009), Table 1.
//!
//! The table gives the multiplicative correction $\eta_e$ to the
//! stagnant-air collision efficiency as a function of the collector radius
//! $R$ (seven columns, 10–100 µm), the radius ratio $r/R$ (eleven rows,
//! 0.0–1.0), and two turbulence-intensity classes split at a dissipation
//! rate of 2.5·10⁻² m²/s³. The dissipation class is a discrete selection,
//! not an interpolation axis — the published data has exactly two columns
//! in that dimension. Collectors above 100 µm fall outside the table's
//! support and take no enhancement at all.
//!
//! All tables are `const` data: immutable, baked in at compile time, and
//! therefore safe to read from any number of threads or GPU dispatches
//! with no synchronisation.

use crate::types::Real;

/// Collector-radius breakpoints (m).
pub const COLLECTOR_RADII: [f64; 7] = [10e-6, 20e-6, 30e-6, 40e-6, 50e-6, 60e-6, 100e-6];

/// Radius-ratio breakpoints $r/R$.
pub const RADIUS_RATIOS: [f64; 11] =
    [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Dissipation rate separating the two turbulence classes (m²/s³).
/// Values at or below the threshold take the low-turbulence column.
pub const DISSIPATION_SPLIT: f64 = 2.5e-2;

/// Enhancement factors, indexed `[ratio row][turbulence class][collector
/// column]`. Class 0 is the low-turbulence column (ε = 100 cm²/s³ in the
/// source), class 1 the high-turbulence column (ε = 400 cm²/s³).
pub const ENHANCEMENT: [[[f64; 7]; 2]; 11] = [
    // r/R = 0.0
    [
        [1.74, 1.74, 1.773, 1.49, 1.207, 1.207, 1.0],
        [4.976, 4.976, 3.593, 2.519, 1.445, 1.445, 1.0],
    ],
    // r/R = 0.1
    [
        [1.46, 1.46, 1.421, 1.245, 1.069, 1.069, 1.0],
        [2.984, 2.984, 2.181, 1.691, 1.201, 1.201, 1.0],
    ],
    // r/R = 0.2
    [
        [1.32, 1.32, 1.245, 1.123, 1.000, 1.000, 1.0],
        [1.988, 1.988, 1.475, 1.313, 1.150, 1.150, 1.0],
    ],
    // r/R = 0.3
    [
        [1.250, 1.250, 1.148, 1.087, 1.025, 1.025, 1.0],
        [1.490, 1.490, 1.187, 1.156, 1.126, 1.126, 1.0],
    ],
    // r/R = 0.4
    [
        [1.186, 1.186, 1.066, 1.060, 1.056, 1.056, 1.0],
        [1.249, 1.249, 1.088, 1.090, 1.092, 1.092, 1.0],
    ],
    // r/R = 0.5
    [
        [1.045, 1.045, 1.000, 1.014, 1.028, 1.028, 1.0],
        [1.139, 1.139, 1.130, 1.091, 1.051, 1.051, 1.0],
    ],
    // r/R = 0.6
    [
        [1.070, 1.070, 1.030, 1.038, 1.046, 1.046, 1.0],
        [1.220, 1.220, 1.190, 1.138, 1.086, 1.086, 1.0],
    ],
    // r/R = 0.7
    [
        [1.000, 1.000, 1.054, 1.042, 1.029, 1.029, 1.0],
        [1.325, 1.325, 1.267, 1.165, 1.063, 1.063, 1.0],
    ],
    // r/R = 0.8
    [
        [1.223, 1.223, 1.117, 1.069, 1.021, 1.021, 1.0],
        [1.716, 1.716, 1.345, 1.223, 1.100, 1.100, 1.0],
    ],
    // r/R = 0.9
    [
        [1.570, 1.570, 1.244, 1.166, 1.088, 1.088, 1.0],
        [3.788, 3.788, 1.501, 1.311, 1.120, 1.120, 1.0],
    ],
    // r/R = 1.0
    [
        [20.3, 20.3, 14.6, 8.61, 2.60, 2.60, 1.0],
        [36.52, 36.52, 19.16, 22.80, 26.0, 26.0, 1.0],
    ],
];

/// Turbulence-driven enhancement of the collision efficiency for a droplet
/// pair with radii `r1`, `r2` (m) under a turbulent kinetic-energy
/// dissipation rate `eps` (m²/s³).
///
/// Pure and free of side effects; safe to call concurrently from any
/// number of threads. Returns exactly `1.0` when the collector (larger)
/// radius exceeds 100 µm — the empirical table has no support there.
///
/// # Panics
/// Panics on non-positive radii or a negative dissipation rate. These are
/// caller contract violations and are not coerced to a default.
pub fn collision_enhancement<R: Real>(r1: R, r2: R, eps: R) -> R {
    R::from_f64(enhancement_f64(r1.as_f64(), r2.as_f64(), eps.as_f64()))
}

fn enhancement_f64(r1: f64, r2: f64, eps: f64) -> f64 {
    assert!(
        r1 > 0.0 && r2 > 0.0,
        "droplet radii must be positive (got {r1:e}, {r2:e})"
    );
    assert!(
        eps >= 0.0,
        "dissipation rate must be non-negative (got {eps:e})"
    );

    let (collector, collected) = if r1 >= r2 { (r1, r2) } else { (r2, r1) };
    if collector > COLLECTOR_RADII[6] {
        return 1.0;
    }

    let class = usize::from(eps > DISSIPATION_SPLIT);

    // First collector breakpoint strictly above R. A collector of exactly
    // 100 µm finds no such breakpoint and lands on the last interval,
    // keeping the result continuous with the large-collector cutoff.
    let col = COLLECTOR_RADII
        .iter()
        .position(|&b| b > collector)
        .unwrap_or(COLLECTOR_RADII.len() - 1);

    // First ratio breakpoint strictly above r/R, searched from 0.1 so the
    // bracketing interval below it always exists; a ratio of exactly 1.0
    // lands on the last interval.
    let ratio = collected / collector;
    let row = RADIUS_RATIOS[1..]
        .iter()
        .position(|&b| b > ratio)
        .map(|i| i + 1)
        .unwrap_or(RADIUS_RATIOS.len() - 1);

    // Both radii below 10 µm: the table has no finer resolution, so the
    // tabulated value is used as-is.
    if col == 0 {
        return ENHANCEMENT[row][class][0];
    }

    // Bilinear interpolation: along the collector axis at the two
    // bracketing ratio rows, then along the ratio axis.
    let t_col =
        (collector - COLLECTOR_RADII[col - 1]) / (COLLECTOR_RADII[col] - COLLECTOR_RADII[col - 1]);
    let t_row = (ratio - RADIUS_RATIOS[row - 1]) / (RADIUS_RATIOS[row] - RADIUS_RATIOS[row - 1]);

    let below = lerp(
        ENHANCEMENT[row - 1][class][col - 1],
        ENHANCEMENT[row - 1][class][col],
        t_col,
    );
    let above = lerp(
        ENHANCEMENT[row][class][col - 1],
        ENHANCEMENT[row][class][col],
        t_col,
    );
    lerp(below, above, t_row)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
