//! Tax-management strategy variants.
//!
//! The four policies form a closed set sharing one harvest/rebalance
//! contract; the engine consults the flags below instead of branching on
//! names inside the daily loop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tax-management policy applied over one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// No harvesting; naive equal-weight monthly rebalance.
    Baseline,
    /// Daily harvesting with immediate same-price repurchase, ignoring the
    /// wash-sale rule (the tax credit is kept and exposure restored).
    GreedyNoWash,
    /// Daily harvesting with the wash-sale restriction observed by the naive
    /// rebalance.
    GreedyWithWash,
    /// Daily harvesting with the wash-sale restriction observed and the
    /// monthly rebalance driven by the tracking-error optimizer.
    Optimized,
}

impl Strategy {
    /// All strategies, in presentation order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Baseline,
        Strategy::GreedyNoWash,
        Strategy::GreedyWithWash,
        Strategy::Optimized,
    ];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Baseline => "Baseline (No Harvesting)",
            Strategy::GreedyNoWash => "Greedy (No Wash Rule)",
            Strategy::GreedyWithWash => "Greedy (With Wash Rule)",
            Strategy::Optimized => "Optimized (Tax Aware)",
        }
    }

    /// Stable identifier used in configs and CLI arguments.
    pub fn id(&self) -> &'static str {
        match self {
            Strategy::Baseline => "baseline",
            Strategy::GreedyNoWash => "greedy-no-wash",
            Strategy::GreedyWithWash => "greedy-with-wash",
            Strategy::Optimized => "optimized",
        }
    }

    /// Parse a stable identifier.
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Whether the daily loss-harvesting pass runs.
    pub fn harvests(&self) -> bool {
        !matches!(self, Strategy::Baseline)
    }

    /// Whether harvested shares are repurchased at the same price on the
    /// same day (restoring exposure without restarting the wash-sale clock).
    pub fn repurchases_immediately(&self) -> bool {
        matches!(self, Strategy::GreedyNoWash)
    }

    /// Whether harvests are recorded in the wash-sale tracker and the
    /// restriction set excluded from rebalances.
    pub fn tracks_wash_sales(&self) -> bool {
        matches!(self, Strategy::GreedyWithWash | Strategy::Optimized)
    }

    /// Whether the monthly rebalance uses the tracking-error optimizer.
    pub fn optimizes_weights(&self) -> bool {
        matches!(self, Strategy::Optimized)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::parse(strategy.id()), Some(strategy));
        }
        assert_eq!(Strategy::parse("unknown"), None);
    }

    #[test]
    fn test_policy_flags() {
        assert!(!Strategy::Baseline.harvests());
        assert!(Strategy::GreedyNoWash.harvests());
        assert!(Strategy::GreedyNoWash.repurchases_immediately());
        assert!(!Strategy::GreedyNoWash.tracks_wash_sales());
        assert!(Strategy::GreedyWithWash.tracks_wash_sales());
        assert!(!Strategy::GreedyWithWash.optimizes_weights());
        assert!(Strategy::Optimized.tracks_wash_sales());
        assert!(Strategy::Optimized.optimizes_weights());
    }
}
