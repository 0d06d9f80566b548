//! Wash-sale restriction tracking.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Per-instrument wash-sale window keyed by the most recent loss-harvest date.
///
/// The tracker never blocks a purchase itself; it only supplies the
/// restriction set the rebalancer excludes from its targets.
#[derive(Debug, Clone)]
pub struct WashSaleTracker {
    window_days: i64,
    last_harvest: BTreeMap<String, NaiveDate>,
}

impl WashSaleTracker {
    /// Create a tracker with the given restriction window in days.
    pub fn new(window_days: i64) -> Self {
        Self {
            window_days,
            last_harvest: BTreeMap::new(),
        }
    }

    /// Record a loss harvest, overwriting any prior entry. The window
    /// restarts from the most recent harvest, not the first.
    pub fn record(&mut self, instrument: &str, date: NaiveDate) {
        self.last_harvest.insert(instrument.to_string(), date);
    }

    /// All instruments whose last loss harvest is within the window of
    /// `current_date`. Expired entries are evicted as a side effect.
    pub fn restricted_set(&mut self, current_date: NaiveDate) -> BTreeSet<String> {
        let window = self.window_days;
        let mut restricted = BTreeSet::new();
        self.last_harvest.retain(|instrument, &mut harvested| {
            if (current_date - harvested).num_days() <= window {
                restricted.insert(instrument.clone());
                true
            } else {
                false
            }
        });
        restricted
    }

    /// Whether a single instrument is currently restricted. Does not evict.
    pub fn is_restricted(&self, instrument: &str, current_date: NaiveDate) -> bool {
        self.last_harvest
            .get(instrument)
            .is_some_and(|&harvested| (current_date - harvested).num_days() <= self.window_days)
    }

    /// Number of tracked entries (including any not yet evicted).
    pub fn len(&self) -> usize {
        self.last_harvest.len()
    }

    /// Whether the tracker holds no entries.
    pub fn is_empty(&self) -> bool {
        self.last_harvest.is_empty()
    }
}
