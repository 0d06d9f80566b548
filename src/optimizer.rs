//! Tracking-error minimization for the optimized rebalance policy.
//!
//! Solves `min (w - w_bench)' S (w - w_bench)` subject to full investment
//! (`sum w = 1`), no shorting (`w >= 0`), and hard zeros on restricted
//! instruments, where `S` is the sample covariance of daily returns over a
//! lookback window and `w_bench` is the equal-weight benchmark over the full
//! universe.
//!
//! The solve is a projected-gradient descent on the restricted simplex with a
//! fixed iteration cap, so it is deterministic and cannot stall the
//! simulation loop. Any failure (too little history, every instrument
//! restricted, non-finite arithmetic) yields `None` and the caller falls back
//! to naive equal weights.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Deterministic bounded-iteration solver for the tracking-error QP.
#[derive(Debug, Clone)]
pub struct TrackingOptimizer {
    /// Maximum projected-gradient iterations per solve.
    pub max_iterations: usize,
    /// Convergence tolerance on the infinity norm of the iterate change.
    pub tolerance: f64,
}

impl Default for TrackingOptimizer {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-10,
        }
    }
}

impl TrackingOptimizer {
    /// Solve for the minimum-tracking-error weights.
    ///
    /// `restricted[i]` pins instrument `i` to weight zero. Returns `None`
    /// when the problem is infeasible (no free instruments) or the iterate
    /// stops being finite.
    pub fn solve(
        &self,
        covariance: &DMatrix<f64>,
        benchmark: &DVector<f64>,
        restricted: &[bool],
    ) -> Option<DVector<f64>> {
        let n = benchmark.len();
        if covariance.nrows() != n || covariance.ncols() != n || restricted.len() != n {
            return None;
        }
        let free: Vec<usize> = (0..n).filter(|&i| !restricted[i]).collect();
        if free.is_empty() {
            return None;
        }

        // Start uniform over the free set; every iterate stays feasible.
        let mut w = DVector::zeros(n);
        let share = 1.0 / free.len() as f64;
        for &i in &free {
            w[i] = share;
        }

        // 1/L step with L bounded by twice the infinity norm of S.
        let inf_norm = (0..n)
            .map(|i| covariance.row(i).iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0_f64, f64::max);
        let step = 1.0 / (2.0 * inf_norm).max(1e-12);

        for _ in 0..self.max_iterations {
            let gradient = 2.0 * (covariance * (&w - benchmark));
            let mut candidate = &w - step * gradient;
            project_restricted_simplex(&mut candidate, restricted);

            if candidate.iter().any(|v| !v.is_finite()) {
                return None;
            }

            let delta = (&candidate - &w).amax();
            w = candidate;
            if delta < self.tolerance {
                break;
            }
        }

        Some(w)
    }
}

/// Project onto `{ w : sum w = 1, w >= 0, w_i = 0 for restricted i }`.
///
/// Sort-based Euclidean projection onto the simplex over the free
/// coordinates; restricted coordinates are zeroed first.
fn project_restricted_simplex(v: &mut DVector<f64>, restricted: &[bool]) {
    let free: Vec<usize> = (0..v.len()).filter(|&i| !restricted[i]).collect();
    for (i, &r) in restricted.iter().enumerate() {
        if r {
            v[i] = 0.0;
        }
    }

    let mut sorted: Vec<f64> = free.iter().map(|&i| v[i]).collect();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut cumsum = 0.0;
    let mut theta = 0.0;
    for (k, &value) in sorted.iter().enumerate() {
        cumsum += value;
        let candidate = (cumsum - 1.0) / (k + 1) as f64;
        if value - candidate > 0.0 {
            theta = candidate;
        }
    }

    for &i in &free {
        v[i] = (v[i] - theta).max(0.0);
    }
}

/// Per-instrument daily simple returns from a window of price rows.
/// Returns `None` with fewer than two rows.
pub fn returns_matrix(price_rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    if price_rows.len() < 2 {
        return None;
    }
    let n = price_rows[0].len();
    let m = price_rows.len() - 1;
    let mut returns = DMatrix::zeros(m, n);
    for i in 0..m {
        for j in 0..n {
            returns[(i, j)] = price_rows[i + 1][j] / price_rows[i][j] - 1.0;
        }
    }
    Some(returns)
}

/// Sample covariance (unbiased, n-1 denominator) of a returns matrix with
/// observations in rows.
pub fn sample_covariance(returns: &DMatrix<f64>) -> DMatrix<f64> {
    let m = returns.nrows();
    let n = returns.ncols();
    let mut centered = returns.clone();
    for j in 0..n {
        let mean = returns.column(j).sum() / m as f64;
        for i in 0..m {
            centered[(i, j)] -= mean;
        }
    }
    (centered.transpose() * centered) / (m as f64 - 1.0)
}

/// Minimum-tracking-error weights over the universe for a lookback window of
/// price rows, or `None` when the optimization cannot run (too few
/// observations, no free instruments, numerical failure).
pub fn minimum_tracking_weights(
    price_window: &[Vec<f64>],
    restricted: &[bool],
    min_observations: usize,
) -> Option<Vec<f64>> {
    if price_window.len() < min_observations {
        debug!(
            observations = price_window.len(),
            min_observations, "insufficient history for optimization"
        );
        return None;
    }

    let returns = returns_matrix(price_window)?;
    let covariance = sample_covariance(&returns);
    let n = covariance.nrows();
    let benchmark = DVector::from_element(n, 1.0 / n as f64);

    let weights = TrackingOptimizer::default().solve(&covariance, &benchmark, restricted)?;
    Some(weights.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_observations_falls_back() {
        let rows: Vec<Vec<f64>> = (0..29).map(|i| vec![100.0 + i as f64, 50.0]).collect();
        assert!(minimum_tracking_weights(&rows, &[false, false], 30).is_none());
    }

    #[test]
    fn test_unrestricted_solution_matches_benchmark() {
        // With w = w_bench feasible the objective minimum is exactly zero.
        let cov = DMatrix::from_diagonal(&DVector::from_element(4, 0.04));
        let bench = DVector::from_element(4, 0.25);
        let w = TrackingOptimizer::default()
            .solve(&cov, &bench, &[false; 4])
            .unwrap();

        for i in 0..4 {
            assert!((w[i] - 0.25).abs() < 1e-8, "w[{i}] = {}", w[i]);
        }
    }

    #[test]
    fn test_restricted_instrument_gets_zero_weight() {
        // Equal diagonal covariance: the freed-up benchmark weight spreads
        // evenly over the remaining names.
        let cov = DMatrix::from_diagonal(&DVector::from_element(4, 0.04));
        let bench = DVector::from_element(4, 0.25);
        let restricted = [true, false, false, false];
        let w = TrackingOptimizer::default()
            .solve(&cov, &bench, &restricted)
            .unwrap();

        assert!(w[0].abs() < 1e-12);
        let total: f64 = w.iter().sum();
        assert!((total - 1.0).abs() < 1e-8);
        for i in 1..4 {
            assert!((w[i] - 1.0 / 3.0).abs() < 1e-6, "w[{i}] = {}", w[i]);
        }
    }

    #[test]
    fn test_all_restricted_is_infeasible() {
        let cov = DMatrix::from_diagonal(&DVector::from_element(2, 0.04));
        let bench = DVector::from_element(2, 0.5);
        assert!(TrackingOptimizer::default()
            .solve(&cov, &bench, &[true, true])
            .is_none());
    }

    #[test]
    fn test_solve_is_deterministic() {
        let returns = DMatrix::from_fn(40, 3, |i, j| {
            ((i * 7 + j * 3) as f64 * 0.37).sin() * 0.02
        });
        let cov = sample_covariance(&returns);
        let bench = DVector::from_element(3, 1.0 / 3.0);
        let restricted = [false, true, false];

        let a = TrackingOptimizer::default().solve(&cov, &bench, &restricted);
        let b = TrackingOptimizer::default().solve(&cov, &bench, &restricted);
        assert_eq!(a, b);
    }

    #[test]
    fn test_returns_matrix() {
        let rows = vec![vec![100.0, 200.0], vec![110.0, 190.0], vec![99.0, 190.0]];
        let returns = returns_matrix(&rows).unwrap();

        assert_eq!(returns.nrows(), 2);
        assert!((returns[(0, 0)] - 0.10).abs() < 1e-12);
        assert!((returns[(0, 1)] + 0.05).abs() < 1e-12);
        assert!((returns[(1, 0)] + 0.10).abs() < 1e-12);
        assert!(returns[(1, 1)].abs() < 1e-12);
    }

    #[test]
    fn test_sample_covariance_symmetric() {
        let returns = DMatrix::from_fn(50, 3, |i, j| ((i + j) as f64 * 0.13).cos() * 0.01);
        let cov = sample_covariance(&returns);

        for i in 0..3 {
            assert!(cov[(i, i)] >= 0.0);
            for j in 0..3 {
                assert!((cov[(i, j)] - cov[(j, i)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_projection_handles_negative_entries() {
        let mut v = DVector::from_vec(vec![0.9, -0.4, 0.8]);
        project_restricted_simplex(&mut v, &[false, false, false]);

        let total: f64 = v.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(v.iter().all(|&x| x >= 0.0));
        assert!(v[1].abs() < 1e-12);
    }
}
