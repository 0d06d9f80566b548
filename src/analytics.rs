//! Post-run performance metrics.

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily simple returns of a value series. One element shorter than the
/// input; empty for fewer than two values.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            if w[0].abs() < f64::EPSILON {
                0.0
            } else {
                w[1] / w[0] - 1.0
            }
        })
        .collect()
}

/// Annualized tracking error: sample standard deviation of the daily
/// difference between portfolio and benchmark returns, scaled by sqrt(252).
///
/// Only the overlapping range where both return series are defined is used;
/// the first (undefined) return of each series is excluded by construction.
/// Fewer than two overlapping observations yield 0.
pub fn tracking_error(portfolio_values: &[f64], benchmark_values: &[f64]) -> f64 {
    let p_returns = simple_returns(portfolio_values);
    let b_returns = simple_returns(benchmark_values);
    let n = p_returns.len().min(b_returns.len());
    if n < 2 {
        return 0.0;
    }

    let diffs: Vec<f64> = p_returns[..n]
        .iter()
        .zip(&b_returns[..n])
        .map(|(p, b)| p - b)
        .collect();

    sample_std(&diffs) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum peak-to-trough drawdown of a value series, as a fraction in
/// [0, 1].
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst
}

/// Annualized growth rate from first to last value over `trading_days`.
pub fn annualized_return(values: &[f64], trading_days: usize) -> f64 {
    if values.len() < 2 || trading_days == 0 {
        return 0.0;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    if first <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    (last / first).powf(1.0 / years) - 1.0
}

/// Sample standard deviation (n-1 denominator); 0 for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}
