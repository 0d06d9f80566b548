//! Configuration file support for simulation runs.
//!
//! Allows loading run configurations from TOML files for reproducibility.

use crate::engine::SimConfig;
use crate::error::{HarvestError, Result};
use crate::scenario::Scenario;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Complete run configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunFileConfig {
    /// Simulation parameters.
    #[serde(default)]
    pub simulation: SimulationSettings,
    /// Price data settings.
    #[serde(default)]
    pub data: DataSettings,
    /// Which strategies and scenarios to run.
    #[serde(default)]
    pub run: RunSettings,
}

/// Simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Starting cash.
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    /// Tax rate on net realized gains.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Loss-harvest trigger threshold (negative).
    #[serde(default = "default_harvest_threshold")]
    pub harvest_threshold: f64,
    /// Wash-sale window in days.
    #[serde(default = "default_wash_window")]
    pub wash_sale_window_days: i64,
    /// Minimum trade size in dollars.
    #[serde(default = "default_min_trade")]
    pub min_trade: f64,
    /// Optimizer lookback cap in trading days.
    #[serde(default = "default_lookback")]
    pub lookback_days: usize,
    /// Minimum observations before the optimizer runs.
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
}

fn default_initial_cash() -> f64 {
    10_000_000.0
}
fn default_tax_rate() -> f64 {
    0.20
}
fn default_harvest_threshold() -> f64 {
    -0.05
}
fn default_wash_window() -> i64 {
    30
}
fn default_min_trade() -> f64 {
    1.0
}
fn default_lookback() -> usize {
    504
}
fn default_min_observations() -> usize {
    30
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            tax_rate: default_tax_rate(),
            harvest_threshold: default_harvest_threshold(),
            wash_sale_window_days: default_wash_window(),
            min_trade: default_min_trade(),
            lookback_days: default_lookback(),
            min_observations: default_min_observations(),
        }
    }
}

/// Price data settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the wide price CSV.
    pub path: Option<String>,
    /// Date format in the CSV (auto-detected when unset).
    pub date_format: Option<String>,
}

/// Strategy/scenario selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Strategy identifiers to run.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
    /// Scenario identifiers to run.
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<String>,
    /// Show a progress bar for single runs.
    #[serde(default)]
    pub show_progress: bool,
}

fn default_strategies() -> Vec<String> {
    Strategy::ALL.iter().map(|s| s.id().to_string()).collect()
}

fn default_scenarios() -> Vec<String> {
    vec![
        Scenario::IncomeWithdrawal.id().to_string(),
        Scenario::CharitableGiving.id().to_string(),
    ]
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            scenarios: default_scenarios(),
            show_progress: false,
        }
    }
}

impl RunFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: RunFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HarvestError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Convert to the engine's [`SimConfig`].
    pub fn to_sim_config(&self) -> Result<SimConfig> {
        let s = &self.simulation;
        if s.initial_cash <= 0.0 {
            return Err(HarvestError::ConfigError(
                "initial_cash must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&s.tax_rate) {
            return Err(HarvestError::ConfigError(
                "tax_rate must be in [0, 1)".to_string(),
            ));
        }
        if s.harvest_threshold >= 0.0 {
            return Err(HarvestError::ConfigError(
                "harvest_threshold must be negative".to_string(),
            ));
        }

        Ok(SimConfig {
            initial_cash: s.initial_cash,
            tax_rate: s.tax_rate,
            harvest_threshold: s.harvest_threshold,
            wash_sale_window_days: s.wash_sale_window_days,
            min_trade: s.min_trade,
            lookback_days: s.lookback_days,
            min_observations: s.min_observations,
            show_progress: self.run.show_progress,
        })
    }

    /// Resolve the configured strategy identifiers.
    pub fn strategies(&self) -> Result<Vec<Strategy>> {
        self.run
            .strategies
            .iter()
            .map(|id| {
                Strategy::parse(id)
                    .ok_or_else(|| HarvestError::ConfigError(format!("unknown strategy: {id}")))
            })
            .collect()
    }

    /// Resolve the configured scenario identifiers.
    pub fn scenarios(&self) -> Result<Vec<Scenario>> {
        self.run
            .scenarios
            .iter()
            .map(|id| {
                Scenario::parse(id)
                    .ok_or_else(|| HarvestError::ConfigError(format!("unknown scenario: {id}")))
            })
            .collect()
    }

    /// Generate an example configuration file.
    pub fn example() -> String {
        r#"# Harvest simulation configuration

[simulation]
initial_cash = 10000000.0
tax_rate = 0.20
harvest_threshold = -0.05   # harvest lots more than 5% under water
wash_sale_window_days = 30
min_trade = 1.0
lookback_days = 504         # two trading years for the optimizer
min_observations = 30

[data]
path = "data/prices.csv"
# date_format = "%Y-%m-%d"

[run]
strategies = ["baseline", "greedy-no-wash", "greedy-with-wash", "optimized"]
scenarios = ["income-withdrawal", "charitable-giving"]
show_progress = false
"#
        .to_string()
    }
}
