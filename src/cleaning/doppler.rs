//! Doppler and clock-drift estimation.
//!
//! Between two steps the reciprocal phase changes by a distance term
//! proportional to the channel difference and a drift term proportional to
//! the time between the steps. Regressing the phase differences of
//! channel-sorted neighbours on `[df, dt]` separates the two; the `dt`
//! coefficient is the drift in radians per step.

use nalgebra::{Matrix2, Vector2};
use num_complex::Complex64;
use std::f64::consts::{PI, TAU};

use crate::constants::RANK_EPSILON;

/// Wrap a phase difference into (-π, π]
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase % TAU;
    if wrapped > PI {
        wrapped - TAU
    } else if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Least-squares fit of `y ≈ rows · x` for a two-column design matrix
///
/// Solves the 2×2 normal equations. When the columns are collinear the basic
/// solution of a column-pivoted solve is returned instead: the column with
/// the larger norm is fitted alone and the other coefficient is zero. An
/// all-zero design yields `[0, 0]`.
pub fn least_squares_2col(rows: &[[f64; 2]], y: &[f64]) -> [f64; 2] {
    let mut ata = Matrix2::<f64>::zeros();
    let mut aty = Vector2::<f64>::zeros();
    for (row, &obs) in rows.iter().zip(y.iter()) {
        let a = Vector2::new(row[0], row[1]);
        ata += a * a.transpose();
        aty += a * obs;
    }

    let det = ata.determinant();
    let scale = ata[(0, 0)] * ata[(1, 1)];
    if scale > 0.0 && det.abs() > RANK_EPSILON * scale {
        if let Some(x) = ata.lu().solve(&aty) {
            return [x[0], x[1]];
        }
    }

    // Rank deficient
    let pivot = if ata[(1, 1)] > ata[(0, 0)] { 1 } else { 0 };
    let norm = ata[(pivot, pivot)];
    if norm <= 0.0 {
        return [0.0, 0.0];
    }
    let mut x = [0.0, 0.0];
    x[pivot] = aty[pivot] / norm;
    x
}

/// Estimate the mean drift rate (rad/step) across antenna paths
///
/// # Arguments
/// * `step_channels` - Channel of every step in acquisition order
/// * `perm` - Stable sort permutation of `step_channels`
/// * `pcts` - Reciprocal products per path, acquisition order
pub fn estimate_doppler(step_channels: &[u8], perm: &[usize], pcts: &[Vec<Complex64>]) -> f64 {
    if perm.len() < 2 || pcts.is_empty() {
        return 0.0;
    }

    let rows: Vec<[f64; 2]> = perm
        .windows(2)
        .map(|w| {
            let df = step_channels[w[1]] as f64 - step_channels[w[0]] as f64;
            let dt = w[1] as f64 - w[0] as f64;
            [df, dt]
        })
        .collect();

    let rates: Vec<f64> = pcts
        .iter()
        .enumerate()
        .map(|(ap, pct)| {
            let phase_delta: Vec<f64> = perm
                .windows(2)
                .map(|w| wrap_phase(pct[w[1]].arg() - pct[w[0]].arg()))
                .collect();
            let x = least_squares_2col(&rows, &phase_delta);
            log::trace!(
                "Antenna path {}: phase slope {:.5} rad/channel, drift {:.5} rad/step",
                ap,
                x[0],
                x[1]
            );
            x[1]
        })
        .collect();

    rates.iter().sum::<f64>() / rates.len() as f64
}

/// Remove a linear phase drift from every path, acquisition order
pub fn remove_phase_ramp(pcts: &mut [Vec<Complex64>], rate: f64) {
    for pct in pcts.iter_mut() {
        for (i, sample) in pct.iter_mut().enumerate() {
            *sample *= Complex64::from_polar(1.0, -rate * i as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_phase(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_phase(PI) - PI).abs() < 1e-12);
        assert!((wrap_phase(-PI) - PI).abs() < 1e-12);
        assert!((wrap_phase(0.25) - 0.25).abs() < 1e-12);
        assert!((wrap_phase(5.0 * TAU + 0.1) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_least_squares_exact_fit() {
        let rows = [[1.0, 2.0], [3.0, -1.0], [2.0, 5.0], [-4.0, 1.0]];
        let y: Vec<f64> = rows.iter().map(|r| 0.7 * r[0] - 0.2 * r[1]).collect();
        let x = least_squares_2col(&rows, &y);
        assert!((x[0] - 0.7).abs() < 1e-12);
        assert!((x[1] + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_least_squares_collinear_uses_pivot_column() {
        // Constant df = 2, dt = 1: columns are parallel
        let rows = vec![[2.0, 1.0]; 9];
        let y = vec![-0.6; 9];
        let x = least_squares_2col(&rows, &y);
        assert!((x[0] + 0.3).abs() < 1e-12);
        assert_eq!(x[1], 0.0);

        let rows = vec![[1.0, 3.0]; 4];
        let y = vec![0.9; 4];
        let x = least_squares_2col(&rows, &y);
        assert_eq!(x[0], 0.0);
        assert!((x[1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_least_squares_zero_design() {
        let rows = vec![[0.0, 0.0]; 3];
        assert_eq!(least_squares_2col(&rows, &[1.0, 2.0, 3.0]), [0.0, 0.0]);
        assert_eq!(least_squares_2col(&[], &[]), [0.0, 0.0]);
    }

    #[test]
    fn test_doppler_averages_paths() {
        let channels: Vec<u8> = vec![10, 2, 14, 6, 18, 4, 12, 8, 16];
        let perm = crate::cleaning::sort_permutation(&channels);
        let pcts: Vec<Vec<Complex64>> = [0.01, 0.03]
            .iter()
            .map(|&rate| {
                channels
                    .iter()
                    .enumerate()
                    .map(|(t, &ch)| Complex64::from_polar(1.0, -0.2 * ch as f64 + rate * t as f64))
                    .collect()
            })
            .collect();
        let doppler = estimate_doppler(&channels, &perm, &pcts);
        assert!((doppler - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_doppler_needs_two_steps() {
        let pcts = vec![vec![Complex64::new(0.0, 1.0)]];
        assert_eq!(estimate_doppler(&[5], &[0], &pcts), 0.0);
        assert_eq!(estimate_doppler(&[], &[], &[Vec::new()]), 0.0);
    }

    #[test]
    fn test_remove_phase_ramp() {
        let mut pcts = vec![(0..6)
            .map(|i| Complex64::from_polar(2.0, 0.1 * i as f64))
            .collect::<Vec<_>>()];
        remove_phase_ramp(&mut pcts, 0.1);
        for s in &pcts[0] {
            assert!((s - Complex64::new(2.0, 0.0)).norm() < 1e-12);
        }
    }
}
