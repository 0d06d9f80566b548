//! Command-line interface for the simulation engine.

use harvest::config::RunFileConfig;
use harvest::data::{load_csv, DataConfig};
use harvest::engine::{Engine, SimConfig, SimulationResult};
use harvest::error::{HarvestError, Result};
use harvest::scenario::Scenario;
use harvest::strategy::Strategy;
use harvest::viz;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Harvest - a tax-loss harvesting simulation engine.
#[derive(Parser)]
#[command(name = "harvest")]
#[command(version = "0.1.0")]
#[command(about = "Simulate tax-loss harvesting strategies over historical prices")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the strategy/scenario grid over a price history
    Run {
        /// Path to the wide price CSV (date column + one column per ticker)
        #[arg(short, long)]
        data: PathBuf,

        /// Optional TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Initial cash (overrides config)
        #[arg(long)]
        capital: Option<f64>,

        /// Run a single strategy instead of the configured set
        #[arg(short = 'S', long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Run a single scenario instead of the configured set
        #[arg(long, value_enum)]
        scenario: Option<ScenarioArg>,

        /// Write the summary table to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write full results (including wealth history) to a JSON file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Show per-run progress bars
        #[arg(long)]
        progress: bool,
    },

    /// Validate a price data file
    Validate {
        /// Path to the price CSV
        #[arg(short, long)]
        data: PathBuf,
    },

    /// List available strategies and scenarios
    Strategies,

    /// Print an example configuration file
    ExampleConfig {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Strategy selector for the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Baseline,
    GreedyNoWash,
    GreedyWithWash,
    Optimized,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Baseline => Strategy::Baseline,
            StrategyArg::GreedyNoWash => Strategy::GreedyNoWash,
            StrategyArg::GreedyWithWash => Strategy::GreedyWithWash,
            StrategyArg::Optimized => Strategy::Optimized,
        }
    }
}

/// Scenario selector for the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioArg {
    None,
    IncomeWithdrawal,
    CharitableGiving,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::None => Scenario::None,
            ScenarioArg::IncomeWithdrawal => Scenario::IncomeWithdrawal,
            ScenarioArg::CharitableGiving => Scenario::CharitableGiving,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Parse arguments and dispatch.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match cli.command {
        Commands::Run {
            data,
            config,
            capital,
            strategy,
            scenario,
            output,
            json,
            progress,
        } => cmd_run(
            data, config, capital, strategy, scenario, output, json, progress,
        ),
        Commands::Validate { data } => cmd_validate(data),
        Commands::Strategies => cmd_strategies(),
        Commands::ExampleConfig { output } => cmd_example_config(output),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    data: PathBuf,
    config: Option<PathBuf>,
    capital: Option<f64>,
    strategy: Option<StrategyArg>,
    scenario: Option<ScenarioArg>,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    progress: bool,
) -> Result<()> {
    let file_config = match config {
        Some(path) => RunFileConfig::load(path)?,
        None => RunFileConfig::default(),
    };

    let mut sim_config: SimConfig = file_config.to_sim_config()?;
    if let Some(capital) = capital {
        sim_config.initial_cash = capital;
    }
    sim_config.show_progress = progress;

    let data_config = DataConfig {
        date_format: file_config.data.date_format.clone(),
        ..Default::default()
    };
    let history = load_csv(&data, &data_config)?;
    info!(
        "Universe: {} instruments over {} trading days",
        history.instruments().len(),
        history.len()
    );

    let strategies = match strategy {
        Some(s) => vec![Strategy::from(s)],
        None => file_config.strategies()?,
    };
    let scenarios = match scenario {
        Some(s) => vec![Scenario::from(s)],
        None => file_config.scenarios()?,
    };

    let engine = Engine::new(sim_config, history);
    let results = engine.run_grid(&strategies, &scenarios);

    println!("\n{}", "SIMULATION RESULTS".bold());
    println!("{}", viz::comparison_table(&results));

    println!("{}", "Wealth curves".bold());
    for result in &results {
        println!("  {}", viz::result_summary(result, 40));
    }

    if let Some(path) = output {
        write_summary_csv(&results, &path)?;
        println!("\nSummary written to {}", path.display().to_string().green());
    }

    if let Some(path) = json {
        let content = serde_json::to_string_pretty(&results)?;
        fs::write(&path, content)?;
        println!("Results written to {}", path.display().to_string().green());
    }

    Ok(())
}

fn cmd_validate(data: PathBuf) -> Result<()> {
    let history = load_csv(&data, &DataConfig::default())?;

    println!("{}", "Price data OK".green().bold());
    println!("  Instruments: {}", history.instruments().len());
    println!("  Trading days: {}", history.len());
    println!(
        "  Range: {} to {}",
        history.date(0),
        history.date(history.len() - 1)
    );
    Ok(())
}

fn cmd_strategies() -> Result<()> {
    println!("{}", "Strategies".bold());
    for strategy in Strategy::ALL {
        println!("  {:<18} {}", strategy.id().cyan(), strategy.name());
    }
    println!("\n{}", "Scenarios".bold());
    for scenario in Scenario::ALL {
        println!("  {:<18} {}", scenario.id().cyan(), scenario.name());
    }
    Ok(())
}

fn cmd_example_config(output: Option<PathBuf>) -> Result<()> {
    let example = RunFileConfig::example();
    match output {
        Some(path) => {
            if path.exists() {
                return Err(HarvestError::ConfigError(format!(
                    "refusing to overwrite existing file: {}",
                    path.display()
                )));
            }
            fs::write(&path, example)?;
            println!("Example config written to {}", path.display());
        }
        None => print!("{example}"),
    }
    Ok(())
}

/// Write the per-run summary metrics to a CSV file.
fn write_summary_csv(results: &[SimulationResult], path: &PathBuf) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "strategy",
        "scenario",
        "final_wealth",
        "total_taxes_paid",
        "cumulative_realized_losses",
        "tracking_error",
    ])?;

    for result in results {
        writer.write_record([
            result.strategy.name(),
            result.scenario.name(),
            &format!("{:.2}", result.final_wealth),
            &format!("{:.2}", result.total_taxes_paid),
            &format!("{:.2}", result.cumulative_realized_losses),
            &format!("{:.6}", result.tracking_error),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
