//! Core data types for the simulation engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single purchase of shares in one instrument.
///
/// Lots are created on every buy (initial allocation, rebalance buy, or
/// harvest repurchase) and are only ever mutated by reducing `shares` on a
/// partial sale. A lot whose shares reach zero is removed from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLot {
    /// Instrument identifier (ticker).
    pub instrument: String,
    /// Acquisition date.
    pub acquired: NaiveDate,
    /// Number of shares remaining in the lot.
    pub shares: f64,
    /// Price per share at acquisition.
    pub cost_basis: f64,
}

impl TaxLot {
    /// Create a new tax lot.
    pub fn new(
        instrument: impl Into<String>,
        acquired: NaiveDate,
        shares: f64,
        cost_basis: f64,
    ) -> Self {
        debug_assert!(shares >= 0.0, "lot created with negative shares");
        Self {
            instrument: instrument.into(),
            acquired,
            shares,
            cost_basis,
        }
    }

    /// Market value of the lot at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    /// Total cost of the remaining shares.
    pub fn total_cost(&self) -> f64 {
        self.shares * self.cost_basis
    }

    /// Unrealized return relative to cost basis at the given price.
    pub fn unrealized_return(&self, price: f64) -> f64 {
        if self.cost_basis.abs() < f64::EPSILON {
            return 0.0;
        }
        (price - self.cost_basis) / self.cost_basis
    }

    /// Check whether the lot has been fully consumed. Sub-nanoshare residue
    /// from float arithmetic counts as empty.
    pub fn is_empty(&self) -> bool {
        self.shares <= 1e-9
    }

    /// Reduce the lot by up to `quantity` shares, returning the amount
    /// actually consumed.
    pub fn consume(&mut self, quantity: f64) -> f64 {
        let taken = quantity.min(self.shares);
        self.shares -= taken;
        debug_assert!(self.shares >= -f64::EPSILON, "lot shares went negative");
        taken
    }

    /// Check whether this lot was acquired within the wash-sale window of a
    /// loss sale in `instrument` on `reference`.
    ///
    /// The policy layer drives wash-sale decisions off the per-instrument
    /// tracker; this per-lot predicate exists for compliance checks against
    /// individual purchases.
    pub fn in_wash_window(&self, instrument: &str, reference: NaiveDate, window_days: i64) -> bool {
        if self.instrument != instrument {
            return false;
        }
        (self.acquired - reference).num_days().abs() <= window_days
    }
}

/// Portfolio and benchmark value on a single trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WealthPoint {
    pub date: NaiveDate,
    /// Total portfolio value (cash + holdings).
    pub portfolio: f64,
    /// Equal-weight benchmark index value.
    pub benchmark: f64,
}
