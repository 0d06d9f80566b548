//! Year-end external cash-flow scenarios.
//!
//! A scenario is invoked once per simulated year-end, after the day's
//! valuation and before tax settlement. It may credit cash (contribution) or
//! raise and remove cash (withdrawal). The charitable-giving scenario also
//! performs a terminal tax-free liquidation of the whole book on the final
//! year-end.

use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Fraction of assets withdrawn each year under [`Scenario::IncomeWithdrawal`].
const WITHDRAWAL_RATE: f64 = 0.05;

/// Cash contributed at each non-final year-end under
/// [`Scenario::CharitableGiving`].
const ANNUAL_CONTRIBUTION: f64 = 1_000_000.0;

/// External cash-flow applied at each year boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// No external cash flows.
    None,
    /// Withdraw 5% of assets under management every year-end, raising cash
    /// by selling 5% of each held instrument (HIFO) when cash is short.
    IncomeWithdrawal,
    /// Contribute $1M at the end of every year except the last; at the final
    /// year-end the entire portfolio is donated: liquidated tax-free with no
    /// gain/loss attribution.
    CharitableGiving,
}

impl Scenario {
    /// All scenarios, in presentation order.
    pub const ALL: [Scenario; 3] = [
        Scenario::None,
        Scenario::IncomeWithdrawal,
        Scenario::CharitableGiving,
    ];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::None => "No Cash Flows",
            Scenario::IncomeWithdrawal => "Income Withdrawal",
            Scenario::CharitableGiving => "Charitable Giving",
        }
    }

    /// Stable identifier used in configs and CLI arguments.
    pub fn id(&self) -> &'static str {
        match self {
            Scenario::None => "none",
            Scenario::IncomeWithdrawal => "income-withdrawal",
            Scenario::CharitableGiving => "charitable-giving",
        }
    }

    /// Parse a stable identifier.
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Apply the scenario at a year boundary. `year` is the calendar year
    /// just ending; `is_final` marks the simulation's last trading day.
    pub fn apply_year_end(
        &self,
        ledger: &mut Ledger,
        prices: &BTreeMap<String, f64>,
        year: i32,
        is_final: bool,
    ) {
        match self {
            Scenario::None => {}
            Scenario::IncomeWithdrawal => withdraw_income(ledger, prices, year),
            Scenario::CharitableGiving => {
                if is_final {
                    let proceeds = ledger.liquidate_tax_free(prices);
                    debug!(year, proceeds, "terminal donation liquidation");
                } else {
                    ledger.cash += ANNUAL_CONTRIBUTION;
                    debug!(year, contribution = ANNUAL_CONTRIBUTION, "annual contribution");
                }
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Withdraw 5% of total value. When cash cannot cover the withdrawal, sell
/// 5% of each held instrument's shares (HIFO, gains and losses accrue as
/// ordinary sales), which together with 5% of the cash covers it.
fn withdraw_income(ledger: &mut Ledger, prices: &BTreeMap<String, f64>, year: i32) {
    let total_value = ledger.total_value(prices);
    let withdrawal = total_value * WITHDRAWAL_RATE;

    if ledger.cash < withdrawal {
        for instrument in ledger.held_instruments() {
            let Some(&price) = prices.get(&instrument) else {
                continue;
            };
            let shares = ledger.shares_held(&instrument) * WITHDRAWAL_RATE;
            ledger.hifo_liquidate(&instrument, shares, price, false);
        }
    }

    ledger.cash -= withdrawal;
    debug!(year, withdrawal, "income withdrawal");
}
