//! Property-based tests for the ledger and wash-sale invariants.
//!
//! These verify, under randomized inputs, that:
//! 1. HIFO liquidation always exhausts higher-basis lots before lower ones
//! 2. Shares and cash are conserved exactly across sales
//! 3. The harvesting scan respects its threshold on both sides
//! 4. The wash-sale window has inclusive [D, D+window] semantics
//! 5. Optimizer output is always a feasible weight vector

use chrono::NaiveDate;
use proptest::prelude::*;

use harvest::ledger::Ledger;
use harvest::optimizer::minimum_tracking_weights;
use harvest::types::TaxLot;
use harvest::wash_sale::WashSaleTracker;
use std::collections::BTreeMap;

fn day0() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

/// Strategy generating a small book of lots in one instrument.
fn lots_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec(
        (1.0..500.0f64, 10.0..400.0f64), // (shares, cost basis)
        1..8,
    )
}

fn build_ledger(lots: &[(f64, f64)]) -> Ledger {
    let mut ledger = Ledger::new(0.0, 0.20);
    for (i, &(shares, basis)) in lots.iter().enumerate() {
        ledger.add_lot(TaxLot::new(
            "TEST",
            day0() + chrono::Duration::days(i as i64),
            shares,
            basis,
        ));
    }
    ledger
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_hifo_exhausts_highest_basis_first(
        lots in lots_strategy(),
        sell_fraction in 0.01..1.0f64,
        price in 10.0..400.0f64,
    ) {
        let total: f64 = lots.iter().map(|(s, _)| s).sum();
        let quantity = total * sell_fraction;

        let mut ledger = build_ledger(&lots);
        ledger.hifo_liquidate("TEST", quantity, price, false);

        // Model the sale against the originals sorted descending by basis:
        // consumption must be a prefix of that ordering.
        let mut originals = lots.clone();
        originals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        let mut to_sell = quantity;
        let expected_left: Vec<(f64, f64)> = originals
            .iter()
            .map(|&(shares, basis)| {
                let taken = to_sell.min(shares);
                to_sell -= taken;
                (shares - taken, basis)
            })
            .collect();

        // Compare remaining shares per basis level (duplicate bases are
        // interchangeable under HIFO).
        let remaining: Vec<(f64, f64)> = ledger
            .lots("TEST")
            .map(|ls| ls.iter().map(|l| (l.shares, l.cost_basis)).collect())
            .unwrap_or_default();

        for &(_, basis) in &originals {
            let actual: f64 = remaining
                .iter()
                .filter(|(_, b)| (b - basis).abs() < 1e-12)
                .map(|(s, _)| s)
                .sum();
            let expected: f64 = expected_left
                .iter()
                .filter(|(_, b)| (b - basis).abs() < 1e-12)
                .map(|(s, _)| s)
                .sum();
            prop_assert!(
                (actual - expected).abs() < 1e-6,
                "basis {basis}: {actual} shares left, expected {expected}"
            );
        }
    }

    #[test]
    fn prop_sale_conserves_shares_and_cash(
        lots in lots_strategy(),
        quantity in 1.0..2000.0f64,
        price in 10.0..400.0f64,
    ) {
        let mut ledger = build_ledger(&lots);
        let held_before = ledger.shares_held("TEST");
        let cash_before = ledger.cash;

        ledger.hifo_liquidate("TEST", quantity, price, false);

        let held_after = ledger.shares_held("TEST");
        let sold = held_before - held_after;

        // Sold exactly the requested quantity, capped at the book.
        prop_assert!((sold - quantity.min(held_before)).abs() < 1e-6);
        // Cash moves by exactly the proceeds.
        prop_assert!((ledger.cash - cash_before - sold * price).abs() < 1e-6);
        // The book never goes negative and empties cleanly.
        prop_assert!(held_after >= -1e-9);
        if held_after.abs() < 1e-9 {
            prop_assert!(ledger.lots("TEST").is_none());
        }
    }

    #[test]
    fn prop_harvest_respects_threshold(
        lots in lots_strategy(),
        price in 10.0..400.0f64,
    ) {
        let threshold = -0.05;
        let mut ledger = build_ledger(&lots);
        let prices: BTreeMap<String, f64> = [("TEST".to_string(), price)].into();

        let sold = ledger.harvest_loss_positions(&prices, threshold, false);

        // Every lot strictly below its trigger was sold; none above remain
        // sold. Survivors must all be at or above the trigger.
        if let Some(remaining) = ledger.lots("TEST") {
            for lot in remaining {
                prop_assert!(price >= lot.cost_basis * (1.0 + threshold));
            }
        }

        let expected_sold: f64 = lots
            .iter()
            .filter(|(_, basis)| price < basis * (1.0 + threshold))
            .map(|(shares, _)| shares)
            .sum();
        let actual_sold = sold.get("TEST").copied().unwrap_or(0.0);
        prop_assert!((actual_sold - expected_sold).abs() < 1e-6);
    }

    #[test]
    fn prop_wash_window_is_inclusive(
        offset in 0i64..60,
    ) {
        let mut tracker = WashSaleTracker::new(30);
        tracker.record("TEST", day0());

        let date = day0() + chrono::Duration::days(offset);
        let restricted = tracker.restricted_set(date).contains("TEST");
        prop_assert_eq!(restricted, offset <= 30);
    }

    #[test]
    fn prop_optimizer_weights_are_feasible(
        seed in 0u64..1000,
        restrict_mask in 0usize..7, // never all-restricted for n = 3
    ) {
        // Deterministic pseudo-random price window derived from the seed.
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| {
                (0..3)
                    .map(|j| {
                        let x = ((i * 31 + j * 17) as f64 + seed as f64) * 0.613;
                        100.0 * (1.0 + 0.02 * x.sin())
                    })
                    .collect()
            })
            .collect();

        let restricted = [
            restrict_mask & 1 != 0,
            restrict_mask & 2 != 0,
            restrict_mask & 4 != 0,
        ];

        let weights = minimum_tracking_weights(&rows, &restricted, 30).unwrap();

        let total: f64 = weights.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-6, "weights sum to {total}");
        for (i, &w) in weights.iter().enumerate() {
            prop_assert!(w >= -1e-12, "w[{i}] = {w} negative");
            if restricted[i] {
                prop_assert!(w.abs() < 1e-9, "restricted w[{i}] = {w}");
            }
        }
    }
}
