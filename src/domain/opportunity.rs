//! Detected spot/perp basis opportunity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::Symbol;
use super::money::{Pct, Price, Usd};

/// A detected arbitrage opportunity.
///
/// Immutable once created; fields are exposed read-only through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    spot_symbol: Symbol,
    perp_symbol: Symbol,
    spot_price: Price,
    perp_price: Price,
    spread_pct: Pct,
    expected_profit: Usd,
    trade_size: Usd,
    timestamp: DateTime<Utc>,
}

impl Opportunity {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        spot_symbol: Symbol,
        perp_symbol: Symbol,
        spot_price: Price,
        perp_price: Price,
        spread_pct: Pct,
        expected_profit: Usd,
        trade_size: Usd,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            spot_symbol,
            perp_symbol,
            spot_price,
            perp_price,
            spread_pct,
            expected_profit,
            trade_size,
            timestamp,
        }
    }

    #[must_use]
    pub fn spot_symbol(&self) -> &Symbol {
        &self.spot_symbol
    }

    #[must_use]
    pub fn perp_symbol(&self) -> &Symbol {
        &self.perp_symbol
    }

    #[must_use]
    pub fn spot_price(&self) -> Price {
        self.spot_price
    }

    #[must_use]
    pub fn perp_price(&self) -> Price {
        self.perp_price
    }

    /// Perp premium over spot, in percent.
    #[must_use]
    pub fn spread_pct(&self) -> Pct {
        self.spread_pct
    }

    /// Profit after the round-trip fee if the spread fully converges.
    #[must_use]
    pub fn expected_profit(&self) -> Usd {
        self.expected_profit
    }

    #[must_use]
    pub fn trade_size(&self) -> Usd {
        self.trade_size
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
