//! Terminal-friendly visualization of simulation results.
//!
//! ASCII sparklines for wealth curves and a comparison table for the
//! strategy/scenario grid.

use crate::engine::SimulationResult;
use std::fmt::Write;

/// Characters used for sparkline rendering, ordered from low to high.
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Generate an ASCII sparkline from a slice of values, at most `width`
/// characters wide.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let sampled = if values.len() > width {
        downsample(values, width)
    } else {
        values.to_vec()
    };

    let min_val = sampled.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_val = sampled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max_val - min_val;

    let mut result = String::with_capacity(sampled.len() * 4);
    for &val in &sampled {
        let normalized = if range > 0.0 {
            ((val - min_val) / range).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let idx = ((normalized * 7.0).round() as usize).min(7);
        result.push(SPARKLINE_CHARS[idx]);
    }

    result
}

/// Downsample values to a target length by chunk averaging.
fn downsample(values: &[f64], target_len: usize) -> Vec<f64> {
    if values.len() <= target_len {
        return values.to_vec();
    }

    let chunk_size = values.len() as f64 / target_len as f64;
    let mut result = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let start = (i as f64 * chunk_size).floor() as usize;
        let end = (((i + 1) as f64 * chunk_size).ceil() as usize).min(values.len());
        if start < end {
            let sum: f64 = values[start..end].iter().sum();
            result.push(sum / (end - start) as f64);
        }
    }

    result
}

/// Sparkline of a run's wealth curve.
pub fn wealth_sparkline(result: &SimulationResult, width: usize) -> String {
    sparkline(&result.portfolio_values(), width)
}

/// One-line summary of a run: sparkline plus key metrics.
pub fn result_summary(result: &SimulationResult, width: usize) -> String {
    format!(
        "[{}] {} / {} | Wealth: ${:.0} | Taxes: ${:.0} | TE: {:.4}",
        wealth_sparkline(result, width),
        result.strategy.name(),
        result.scenario.name(),
        result.final_wealth,
        result.total_taxes_paid,
        result.tracking_error
    )
}

/// Render the grid results as an aligned comparison table.
pub fn comparison_table(results: &[SimulationResult]) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "{:<26} {:<20} {:>16} {:>14} {:>16} {:>10} {:>9}",
        "Strategy", "Scenario", "Final Wealth", "Taxes Paid", "Realized Losses", "Track Err", "Max DD"
    )
    .unwrap();
    writeln!(output, "{}", "─".repeat(116)).unwrap();

    for result in results {
        writeln!(
            output,
            "{:<26} {:<20} {:>16.2} {:>14.2} {:>16.2} {:>10.4} {:>8.1}%",
            result.strategy.name(),
            result.scenario.name(),
            result.final_wealth,
            result.total_taxes_paid,
            result.cumulative_realized_losses,
            result.tracking_error,
            result.max_drawdown_pct()
        )
        .unwrap();
    }

    output
}
