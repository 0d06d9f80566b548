//! Price-history loading and access for the simulation engine.
//!
//! The engine consumes a dense, forward-filled table of daily prices: one row
//! per trading day sorted ascending by date, one column per instrument. The
//! instrument universe is taken from the table header and stays fixed for the
//! whole simulation.

use crate::error::{HarvestError, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration for loading a price CSV.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Date format string for parsing (e.g. "%Y-%m-%d"). If `None`, common
    /// formats are attempted in order.
    pub date_format: Option<String>,
    /// CSV delimiter character.
    pub delimiter: u8,
    /// Forward-fill empty cells from the previous row.
    pub forward_fill: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            delimiter: b',',
            forward_fill: true,
        }
    }
}

/// Dense daily price table over a fixed instrument universe.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    instruments: Vec<String>,
    dates: Vec<NaiveDate>,
    /// `rows[i][j]` is the price of `instruments[j]` on `dates[i]`.
    rows: Vec<Vec<f64>>,
}

impl PriceHistory {
    /// Build a history from parts, validating shape and ordering.
    pub fn from_parts(
        instruments: Vec<String>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if instruments.is_empty() {
            return Err(HarvestError::EmptyUniverse);
        }
        if dates.is_empty() || rows.is_empty() {
            return Err(HarvestError::NoData);
        }
        if dates.len() != rows.len() {
            return Err(HarvestError::InvalidInput(format!(
                "{} dates but {} price rows",
                dates.len(),
                rows.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != instruments.len() {
                return Err(HarvestError::InvalidInput(format!(
                    "row {} has {} prices for {} instruments",
                    i,
                    row.len(),
                    instruments.len()
                )));
            }
            if row.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(HarvestError::DataError(format!(
                    "non-positive or non-finite price in row {i}"
                )));
            }
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(HarvestError::DataError(format!(
                    "dates not strictly ascending at {}",
                    pair[1]
                )));
            }
        }
        Ok(Self {
            instruments,
            dates,
            rows,
        })
    }

    /// Number of trading days.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The ordered instrument universe.
    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// All trading dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Date of trading day `i`.
    pub fn date(&self, i: usize) -> NaiveDate {
        self.dates[i]
    }

    /// Per-instrument price snapshot for trading day `i`.
    pub fn snapshot(&self, i: usize) -> BTreeMap<String, f64> {
        self.instruments
            .iter()
            .cloned()
            .zip(self.rows[i].iter().copied())
            .collect()
    }

    /// Snapshot of the final trading day.
    pub fn last_snapshot(&self) -> BTreeMap<String, f64> {
        self.snapshot(self.len() - 1)
    }

    /// Price rows for the lookback window ending at `end` (inclusive),
    /// with at most `max_rows` rows.
    pub fn price_window(&self, end: usize, max_rows: usize) -> &[Vec<f64>] {
        let start = (end + 1).saturating_sub(max_rows);
        &self.rows[start..=end]
    }

    /// Cross-sectional mean simple return per day; the first day is 0.
    ///
    /// This is the daily return of an equal-weight index of the universe,
    /// used to drive the benchmark.
    pub fn mean_daily_returns(&self) -> Vec<f64> {
        let mut means = Vec::with_capacity(self.len());
        means.push(0.0);
        for i in 1..self.len() {
            let prev = &self.rows[i - 1];
            let cur = &self.rows[i];
            let sum: f64 = cur
                .iter()
                .zip(prev.iter())
                .map(|(c, p)| c / p - 1.0)
                .sum();
            means.push(sum / self.instruments.len() as f64);
        }
        means
    }
}

/// Load a wide price CSV: a date column followed by one column per
/// instrument, rows sorted ascending by date.
pub fn load_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<PriceHistory> {
    let path = path.as_ref();
    info!("Loading price history from: {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter)
        .flexible(false)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(HarvestError::DataError(
            "price CSV needs a date column plus at least one instrument".to_string(),
        ));
    }
    let instruments: Vec<String> = headers.iter().skip(1).map(|s| s.trim().to_string()).collect();

    let mut dates = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut filled_cells = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let date = parse_date(record.get(0).unwrap_or("").trim(), config.date_format.as_deref())?;

        let mut row = Vec::with_capacity(instruments.len());
        for (j, field) in record.iter().skip(1).enumerate() {
            let field = field.trim();
            if field.is_empty() || field.eq_ignore_ascii_case("nan") {
                if config.forward_fill {
                    if let Some(prev) = rows.last() {
                        row.push(prev[j]);
                        filled_cells += 1;
                        continue;
                    }
                }
                return Err(HarvestError::DataError(format!(
                    "missing price for {} on row {} with nothing to fill from",
                    instruments[j],
                    line + 1
                )));
            }
            let price: f64 = field.parse().map_err(|_| {
                HarvestError::DataError(format!(
                    "unparseable price '{}' for {} on row {}",
                    field,
                    instruments[j],
                    line + 1
                ))
            })?;
            row.push(price);
        }

        dates.push(date);
        rows.push(row);
    }

    if filled_cells > 0 {
        warn!("Forward-filled {} missing price cells", filled_cells);
    }
    debug!(
        "Loaded {} trading days across {} instruments",
        dates.len(),
        instruments.len()
    );

    PriceHistory::from_parts(instruments, dates, rows)
}

/// Parse a date string, trying common formats when none is specified.
fn parse_date(s: &str, format: Option<&str>) -> Result<NaiveDate> {
    if let Some(fmt) = format {
        return Ok(NaiveDate::parse_from_str(s, fmt)?);
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(HarvestError::DataError(format!(
        "unable to parse date: '{s}'"
    )))
}
