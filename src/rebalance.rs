//! Target-weight computation and trade execution against the ledger.

use crate::ledger::Ledger;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Equal weights over every non-restricted, price-available instrument in
/// the universe. Restricted instruments get weight zero (they are simply
/// absent from the map).
pub fn naive_weights(
    universe: &[String],
    prices: &BTreeMap<String, f64>,
    restricted: &BTreeSet<String>,
) -> BTreeMap<String, f64> {
    let eligible: Vec<&String> = universe
        .iter()
        .filter(|t| !restricted.contains(*t) && prices.contains_key(*t))
        .collect();
    if eligible.is_empty() {
        return BTreeMap::new();
    }
    let weight = 1.0 / eligible.len() as f64;
    eligible.into_iter().map(|t| (t.clone(), weight)).collect()
}

/// Convert an optimizer weight vector (aligned with `universe`) into a target
/// map, dropping near-zero entries.
pub fn weights_from_vector(universe: &[String], weights: &[f64]) -> BTreeMap<String, f64> {
    universe
        .iter()
        .zip(weights.iter())
        .filter(|(_, &w)| w > 1e-5)
        .map(|(t, &w)| (t.clone(), w))
        .collect()
}

/// Rebalance the ledger toward `weights` at the given prices.
///
/// Overweight holdings are sold down via HIFO (an ordinary sale, no tax
/// credit; gains and losses still accrue to the year-to-date totals), then
/// underweight targets are bought with whatever cash is available. Buys are
/// capped at cash and trades under `min_trade` dollars are skipped.
pub fn execute(
    ledger: &mut Ledger,
    weights: &BTreeMap<String, f64>,
    prices: &BTreeMap<String, f64>,
    date: NaiveDate,
    min_trade: f64,
) {
    let total_value = ledger.total_value(prices);

    // Sells first so the buys below can use the freed-up cash.
    for instrument in ledger.held_instruments() {
        let Some(&price) = prices.get(&instrument) else {
            continue;
        };
        let target_value = total_value * weights.get(&instrument).copied().unwrap_or(0.0);
        let current_value = ledger.shares_held(&instrument) * price;

        if current_value > target_value {
            let excess = current_value - target_value;
            if excess <= 1e-9 {
                continue;
            }
            let shares = excess / price;
            debug!(instrument = instrument.as_str(), shares, "rebalance sell");
            ledger.hifo_liquidate(&instrument, shares, price, false);
        }
    }

    for (instrument, &weight) in weights {
        let Some(&price) = prices.get(instrument) else {
            continue;
        };
        let target_value = total_value * weight;
        let current_value = ledger.shares_held(instrument) * price;

        if current_value < target_value {
            let needed = (target_value - current_value).min(ledger.cash);
            if needed < min_trade {
                continue;
            }
            let shares = needed / price;
            debug!(instrument = instrument.as_str(), shares, "rebalance buy");
            ledger.buy(instrument, date, shares, price);
        }
    }
}
