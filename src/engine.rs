//! Day-by-day simulation engine.

use crate::analytics;
use crate::data::PriceHistory;
use crate::ledger::Ledger;
use crate::optimizer;
use crate::rebalance;
use crate::scenario::Scenario;
use crate::strategy::Strategy;
use crate::types::WealthPoint;
use crate::wash_sale::WashSaleTracker;
use chrono::Datelike;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Configuration for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Starting cash for each run.
    pub initial_cash: f64,
    /// Tax rate applied to net realized gains and immediate loss credits.
    pub tax_rate: f64,
    /// Loss-harvesting trigger: a lot is sold when its price falls below
    /// `cost_basis * (1 + harvest_threshold)` (negative, e.g. -0.05).
    pub harvest_threshold: f64,
    /// Wash-sale restriction window in days.
    pub wash_sale_window_days: i64,
    /// Minimum trade size in dollars; smaller rebalance trades are skipped.
    pub min_trade: f64,
    /// Maximum lookback rows of prices fed to the optimizer (two trading
    /// years).
    pub lookback_days: usize,
    /// Minimum price observations required before the optimizer runs.
    pub min_observations: usize,
    /// Show a progress bar during the run.
    pub show_progress: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_cash: 10_000_000.0,
            tax_rate: 0.20,
            harvest_threshold: -0.05,
            wash_sale_window_days: 30,
            min_trade: 1.0,
            lookback_days: 504,
            min_observations: 30,
            show_progress: true,
        }
    }
}

/// Results from one strategy/scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Strategy simulated.
    pub strategy: Strategy,
    /// Cash-flow scenario applied at year boundaries.
    pub scenario: Scenario,
    /// Starting cash.
    pub initial_cash: f64,
    /// Portfolio value on the final trading day.
    pub final_wealth: f64,
    /// Lifetime tax paid.
    pub total_taxes_paid: f64,
    /// Sum of each year's realized losses at settlement time.
    pub cumulative_realized_losses: f64,
    /// Annualized tracking error versus the equal-weight benchmark.
    pub tracking_error: f64,
    /// Daily portfolio and benchmark values.
    pub wealth_history: Vec<WealthPoint>,
}

impl SimulationResult {
    /// Daily portfolio values.
    pub fn portfolio_values(&self) -> Vec<f64> {
        self.wealth_history.iter().map(|p| p.portfolio).collect()
    }

    /// Daily benchmark values.
    pub fn benchmark_values(&self) -> Vec<f64> {
        self.wealth_history.iter().map(|p| p.benchmark).collect()
    }

    /// Total return over the run, in percent.
    pub fn total_return_pct(&self) -> f64 {
        (self.final_wealth - self.initial_cash) / self.initial_cash * 100.0
    }

    /// Maximum drawdown of the wealth curve, in percent.
    pub fn max_drawdown_pct(&self) -> f64 {
        analytics::max_drawdown(&self.portfolio_values()) * 100.0
    }
}

/// The simulation engine: one price history, many runs.
#[derive(Debug, Clone)]
pub struct Engine {
    config: SimConfig,
    data: PriceHistory,
}

impl Engine {
    /// Create an engine over a validated price history.
    pub fn new(config: SimConfig, data: PriceHistory) -> Self {
        Self { config, data }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The price history driving the simulation.
    pub fn data(&self) -> &PriceHistory {
        &self.data
    }

    /// Run one strategy under one scenario over the full horizon.
    ///
    /// The ledger and wash-sale tracker are created fresh for the run, so
    /// repeated runs are independent and deterministic.
    pub fn run(&self, strategy: Strategy, scenario: Scenario) -> SimulationResult {
        let days = self.data.len();
        let universe = self.data.instruments();

        info!(
            "Running {} under {} ({} trading days, {} instruments)",
            strategy.name(),
            scenario.name(),
            days,
            universe.len()
        );

        let mut ledger = Ledger::new(self.config.initial_cash, self.config.tax_rate);
        let mut tracker = WashSaleTracker::new(self.config.wash_sale_window_days);
        let mean_returns = self.data.mean_daily_returns();

        let mut benchmark = self.config.initial_cash;
        let mut carryforward = 0.0;
        let mut cumulative_losses = 0.0;
        let mut history = Vec::with_capacity(days);

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(days as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        for i in 0..days {
            let date = self.data.date(i);
            let prices = self.data.snapshot(i);

            // (a) + (b): harvesting pass and policy follow-up.
            if strategy.harvests() {
                let sold = ledger.harvest_loss_positions(
                    &prices,
                    self.config.harvest_threshold,
                    true,
                );

                if strategy.repurchases_immediately() {
                    for (instrument, &qty) in &sold {
                        let price = prices[instrument];
                        if ledger.cash >= qty * price {
                            ledger.buy(instrument, date, qty, price);
                        }
                    }
                }

                if strategy.tracks_wash_sales() {
                    for instrument in sold.keys() {
                        tracker.record(instrument, date);
                    }
                }
            }

            // (c): monthly rebalance on the first trading day of each month.
            let month_start = i == 0 || self.data.date(i - 1).month() != date.month();
            if month_start {
                let restricted = if strategy.tracks_wash_sales() {
                    tracker.restricted_set(date)
                } else {
                    BTreeSet::new()
                };

                let weights = if strategy.optimizes_weights() {
                    let window = self.data.price_window(i, self.config.lookback_days);
                    let flags: Vec<bool> =
                        universe.iter().map(|t| restricted.contains(t)).collect();
                    match optimizer::minimum_tracking_weights(
                        window,
                        &flags,
                        self.config.min_observations,
                    ) {
                        Some(v) => rebalance::weights_from_vector(universe, &v),
                        None => {
                            warn!(%date, "optimization unavailable, using naive weights");
                            rebalance::naive_weights(universe, &prices, &restricted)
                        }
                    }
                } else {
                    rebalance::naive_weights(universe, &prices, &restricted)
                };

                rebalance::execute(
                    &mut ledger,
                    &weights,
                    &prices,
                    date,
                    self.config.min_trade,
                );
            }

            // (d): benchmark compounds by the universe's mean daily return.
            if i > 0 {
                benchmark *= 1.0 + mean_returns[i];
            }
            history.push(WealthPoint {
                date,
                portfolio: ledger.total_value(&prices),
                benchmark,
            });

            // (e): year boundary — scenario cash flow, then tax settlement.
            let year_end = i + 1 == days || self.data.date(i + 1).year() != date.year();
            if year_end {
                let is_final = i + 1 == days;
                scenario.apply_year_end(&mut ledger, &prices, date.year(), is_final);

                cumulative_losses += ledger.realized_losses;
                let tax_before = ledger.total_tax_paid;
                carryforward = settle_taxes(&mut ledger, carryforward, self.config.tax_rate);
                debug!(
                    year = date.year(),
                    tax_due = ledger.total_tax_paid - tax_before,
                    carryforward,
                    "year-end settlement"
                );
            }

            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let final_wealth = ledger.total_value(&self.data.last_snapshot());
        let portfolio_values: Vec<f64> = history.iter().map(|p| p.portfolio).collect();
        let benchmark_values: Vec<f64> = history.iter().map(|p| p.benchmark).collect();
        let tracking_error = analytics::tracking_error(&portfolio_values, &benchmark_values);

        info!(
            "Completed {}: final wealth {:.2}, taxes {:.2}, TE {:.4}",
            strategy.name(),
            final_wealth,
            ledger.total_tax_paid,
            tracking_error
        );

        SimulationResult {
            strategy,
            scenario,
            initial_cash: self.config.initial_cash,
            final_wealth,
            total_taxes_paid: ledger.total_tax_paid,
            cumulative_realized_losses: cumulative_losses,
            tracking_error,
            wealth_history: history,
        }
    }

    /// Run every strategy/scenario pair in parallel.
    ///
    /// Runs share no mutable state, so the grid is embarrassingly parallel;
    /// results come back in grid order.
    pub fn run_grid(
        &self,
        strategies: &[Strategy],
        scenarios: &[Scenario],
    ) -> Vec<SimulationResult> {
        let mut quiet = self.clone();
        quiet.config.show_progress = false;

        let pairs: Vec<(Strategy, Scenario)> = scenarios
            .iter()
            .flat_map(|sc| strategies.iter().map(move |st| (*st, *sc)))
            .collect();

        pairs
            .par_iter()
            .map(|(strategy, scenario)| quiet.run(*strategy, *scenario))
            .collect()
    }
}

/// Year-end tax settlement with loss carryforward.
///
/// `net = realized_gains - realized_losses - carryforward`. A positive net is
/// taxed and the carryforward resets; otherwise the shortfall carries
/// forward. Year-to-date accumulators reset either way. Returns the new
/// carryforward.
fn settle_taxes(ledger: &mut Ledger, carryforward: f64, tax_rate: f64) -> f64 {
    let net = ledger.realized_gains - ledger.realized_losses - carryforward;

    let next_carryforward = if net > 0.0 {
        let tax_due = net * tax_rate;
        ledger.total_tax_paid += tax_due;
        ledger.cash -= tax_due;
        0.0
    } else {
        -net
    };

    ledger.realized_gains = 0.0;
    ledger.realized_losses = 0.0;
    next_carryforward
}
