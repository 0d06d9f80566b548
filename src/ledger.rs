//! Lot-level ledger: cash, holdings, and realized gain/loss accounting.

use crate::types::TaxLot;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Tolerance below which share quantities and cash deltas are treated as zero.
const QTY_EPSILON: f64 = 1e-9;

/// Cost-basis ledger for one simulation run.
///
/// Owns the cash balance, the per-instrument tax-lot collections, and the
/// year-to-date realized gain/loss accumulators. Holdings are keyed by
/// instrument in a `BTreeMap` so every scan over the book is deterministic.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Available cash.
    pub cash: f64,
    /// Open tax lots per instrument. An instrument key is removed as soon as
    /// its lot collection empties.
    holdings: BTreeMap<String, Vec<TaxLot>>,
    /// Year-to-date realized gains.
    pub realized_gains: f64,
    /// Year-to-date realized losses, stored as a positive magnitude.
    pub realized_losses: f64,
    /// Lifetime tax paid; monotonically non-decreasing.
    pub total_tax_paid: f64,
    /// Tax rate applied to immediate loss credits.
    tax_rate: f64,
}

impl Ledger {
    /// Create a ledger with the given starting cash and tax rate.
    pub fn new(initial_cash: f64, tax_rate: f64) -> Self {
        Self {
            cash: initial_cash,
            holdings: BTreeMap::new(),
            realized_gains: 0.0,
            realized_losses: 0.0,
            total_tax_paid: 0.0,
            tax_rate,
        }
    }

    /// Tax rate used for immediate loss credits.
    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Append a lot to its instrument's collection, creating the collection
    /// if absent.
    pub fn add_lot(&mut self, lot: TaxLot) {
        if lot.is_empty() {
            return;
        }
        self.holdings
            .entry(lot.instrument.clone())
            .or_default()
            .push(lot);
    }

    /// Buy `shares` of `instrument` at `price`, creating a new lot and
    /// debiting cash.
    pub fn buy(&mut self, instrument: &str, date: NaiveDate, shares: f64, price: f64) {
        if shares <= QTY_EPSILON {
            return;
        }
        let cost = shares * price;
        debug_assert!(
            cost <= self.cash + 1e-6,
            "buy of {cost:.2} exceeds cash {:.2}",
            self.cash
        );
        self.cash -= cost;
        self.add_lot(TaxLot::new(instrument, date, shares, price));
    }

    /// Sell up to `quantity` shares of `instrument` at `price`, consuming the
    /// highest cost-basis lots first.
    ///
    /// Each lot portion's `proceeds - cost` is added to `realized_gains` if
    /// positive, otherwise to `realized_losses` as a magnitude. With
    /// `apply_tax_credit`, a loss immediately credits cash by
    /// `loss * tax_rate`. Returns the total realized gain/loss of the sale;
    /// an unheld instrument returns 0. The requested quantity is capped at
    /// the shares held, so the book never goes negative.
    ///
    /// Ties on cost basis break by earlier acquisition date, then insertion
    /// order, so repeated runs liquidate identically.
    pub fn hifo_liquidate(
        &mut self,
        instrument: &str,
        quantity: f64,
        price: f64,
        apply_tax_credit: bool,
    ) -> f64 {
        if quantity <= QTY_EPSILON {
            return 0.0;
        }
        let Some(lots) = self.holdings.get_mut(instrument) else {
            return 0.0;
        };

        let mut order: Vec<usize> = (0..lots.len()).collect();
        order.sort_by(|&a, &b| {
            lots[b]
                .cost_basis
                .partial_cmp(&lots[a].cost_basis)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| lots[a].acquired.cmp(&lots[b].acquired))
                .then_with(|| a.cmp(&b))
        });

        let mut remaining = quantity;
        let mut realized = 0.0;
        let mut proceeds_total = 0.0;
        let mut credit_total = 0.0;
        let mut gains = 0.0;
        let mut losses = 0.0;

        for idx in order {
            if remaining <= QTY_EPSILON {
                break;
            }
            let lot = &mut lots[idx];
            let sold = lot.consume(remaining);
            if sold <= QTY_EPSILON {
                continue;
            }
            remaining -= sold;

            let proceeds = sold * price;
            let cost = sold * lot.cost_basis;
            let gl = proceeds - cost;
            realized += gl;
            proceeds_total += proceeds;
            if gl > 0.0 {
                gains += gl;
            } else {
                losses += -gl;
                if apply_tax_credit {
                    credit_total += -gl * self.tax_rate;
                }
            }
        }

        self.cash += proceeds_total + credit_total;
        self.realized_gains += gains;
        self.realized_losses += losses;
        self.prune(instrument);
        realized
    }

    /// Scan every lot and fully liquidate those trading below
    /// `cost_basis * (1 + threshold)` (threshold negative).
    ///
    /// Lots are evaluated independently; no HIFO ordering applies. Each sale
    /// records its loss (and optional immediate tax credit) exactly as in
    /// [`hifo_liquidate`](Self::hifo_liquidate). Instruments missing from the
    /// snapshot are skipped. Returns shares sold per instrument.
    pub fn harvest_loss_positions(
        &mut self,
        prices: &BTreeMap<String, f64>,
        threshold: f64,
        apply_tax_credit: bool,
    ) -> BTreeMap<String, f64> {
        let mut sold = BTreeMap::new();
        let mut proceeds_total = 0.0;
        let mut credit_total = 0.0;
        let mut losses = 0.0;
        let tax_rate = self.tax_rate;

        for (instrument, lots) in self.holdings.iter_mut() {
            let Some(&price) = prices.get(instrument) else {
                continue;
            };

            let mut qty = 0.0;
            lots.retain(|lot| {
                if price < lot.cost_basis * (1.0 + threshold) {
                    let proceeds = lot.shares * price;
                    let loss = lot.total_cost() - proceeds;
                    debug_assert!(loss >= 0.0, "harvested lot realized a gain");
                    proceeds_total += proceeds;
                    losses += loss;
                    if apply_tax_credit {
                        credit_total += loss * tax_rate;
                    }
                    qty += lot.shares;
                    false
                } else {
                    true
                }
            });

            if qty > QTY_EPSILON {
                debug!(instrument = instrument.as_str(), shares = qty, price, "harvested loss lots");
                sold.insert(instrument.clone(), qty);
            }
        }

        self.cash += proceeds_total + credit_total;
        self.realized_losses += losses;
        self.holdings.retain(|_, lots| !lots.is_empty());
        sold
    }

    /// Liquidate the entire book at current prices with no gain/loss
    /// attribution (terminal donation). Instruments missing a price
    /// contribute no proceeds.
    pub fn liquidate_tax_free(&mut self, prices: &BTreeMap<String, f64>) -> f64 {
        let mut proceeds = 0.0;
        for (instrument, lots) in self.holdings.iter() {
            if let Some(&price) = prices.get(instrument) {
                proceeds += lots.iter().map(|l| l.market_value(price)).sum::<f64>();
            }
        }
        self.holdings.clear();
        self.cash += proceeds;
        proceeds
    }

    /// Total portfolio value: cash plus holdings marked at the snapshot.
    /// Instruments absent from `prices` contribute zero.
    pub fn total_value(&self, prices: &BTreeMap<String, f64>) -> f64 {
        let mut value = self.cash;
        for (instrument, lots) in &self.holdings {
            if let Some(&price) = prices.get(instrument) {
                value += lots.iter().map(|l| l.shares).sum::<f64>() * price;
            }
        }
        value
    }

    /// Shares held across all lots of `instrument`.
    pub fn shares_held(&self, instrument: &str) -> f64 {
        self.holdings
            .get(instrument)
            .map(|lots| lots.iter().map(|l| l.shares).sum())
            .unwrap_or(0.0)
    }

    /// Open lots for an instrument, if any.
    pub fn lots(&self, instrument: &str) -> Option<&[TaxLot]> {
        self.holdings.get(instrument).map(|l| l.as_slice())
    }

    /// Instruments currently held, in key order.
    pub fn held_instruments(&self) -> Vec<String> {
        self.holdings.keys().cloned().collect()
    }

    /// Whether any lots of `instrument` are held.
    pub fn is_held(&self, instrument: &str) -> bool {
        self.holdings.contains_key(instrument)
    }

    /// Number of open lots across the whole book.
    pub fn open_lot_count(&self) -> usize {
        self.holdings.values().map(|l| l.len()).sum()
    }

    fn prune(&mut self, instrument: &str) {
        if let Some(lots) = self.holdings.get_mut(instrument) {
            lots.retain(|lot| !lot.is_empty());
            if lots.is_empty() {
                self.holdings.remove(instrument);
            }
        }
    }
}
