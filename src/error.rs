//! Error types for the simulation engine.

use thiserror::Error;

/// Main error type for the simulation engine.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Empty instrument universe")]
    EmptyUniverse,

    #[error("No price history loaded")]
    NoData,

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Optimization error: {0}")]
    OptimizationError(String),
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, HarvestError>;
