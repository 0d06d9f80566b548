//! Harvest - a tax-loss harvesting simulation engine.
//!
//! # Overview
//!
//! Harvest simulates, day by day over a multi-year horizon, the evolution of
//! an investment portfolio under several tax-management strategies, to
//! quantify the wealth impact of tax-loss harvesting under realistic
//! constraints:
//!
//! - **Lot-level accounting**: every buy creates a tax lot; sales consume
//!   lots highest-cost-basis-first (HIFO)
//! - **Loss harvesting**: lots sufficiently under water are liquidated for an
//!   immediate tax credit
//! - **Wash-sale compliance**: harvested names are excluded from repurchase
//!   for a 30-day window
//! - **Two rebalancing policies**: naive equal weight, and a
//!   tracking-error-minimizing quadratic optimization under exclusion
//!   constraints
//! - **Annual tax settlement**: net gains taxed at year end, net losses
//!   carried forward
//!
//! # Quick Start
//!
//! ```no_run
//! use harvest::{
//!     data::{load_csv, DataConfig},
//!     engine::{Engine, SimConfig},
//!     scenario::Scenario,
//!     strategy::Strategy,
//! };
//!
//! let history = load_csv("data/prices.csv", &DataConfig::default()).unwrap();
//! let engine = Engine::new(SimConfig::default(), history);
//!
//! let result = engine.run(Strategy::GreedyWithWash, Scenario::IncomeWithdrawal);
//! println!("Final wealth: ${:.2}", result.final_wealth);
//! println!("Taxes paid:   ${:.2}", result.total_taxes_paid);
//! ```
//!
//! # Modules
//!
//! - [`types`]: core data types ([`TaxLot`], [`WealthPoint`])
//! - [`ledger`]: cash, holdings, and realized gain/loss accounting
//! - [`wash_sale`]: per-instrument wash-sale restriction tracking
//! - [`rebalance`]: target weights and trade execution
//! - [`optimizer`]: tracking-error QP with deterministic fallback
//! - [`data`]: price-history loading and access
//! - [`strategy`]: the four tax-management policies
//! - [`scenario`]: year-end cash-flow scenarios
//! - [`engine`]: the day-by-day simulation loop
//! - [`analytics`]: tracking error, drawdown, return metrics
//! - [`config`]: TOML configuration files
//! - [`viz`]: terminal sparklines and comparison tables

pub mod analytics;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod optimizer;
pub mod rebalance;
pub mod scenario;
pub mod strategy;
pub mod types;
pub mod viz;
pub mod wash_sale;

// Re-exports for convenience
pub use config::RunFileConfig;
pub use data::{load_csv, DataConfig, PriceHistory};
pub use engine::{Engine, SimConfig, SimulationResult};
pub use error::{HarvestError, Result};
pub use ledger::Ledger;
pub use optimizer::TrackingOptimizer;
pub use scenario::Scenario;
pub use strategy::Strategy;
pub use types::{TaxLot, WealthPoint};
pub use wash_sale::WashSaleTracker;
