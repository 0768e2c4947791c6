//! Price samples produced by the feed and consumed per tick.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::Symbol;
use super::money::{spread_pct, Pct, Price};

/// A spot instrument and the perpetual tracking the same underlying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolPair {
    pub spot: Symbol,
    pub perp: Symbol,
}

impl SymbolPair {
    pub fn new(spot: impl Into<Symbol>, perp: impl Into<Symbol>) -> Self {
        Self {
            spot: spot.into(),
            perp: perp.into(),
        }
    }
}

impl fmt::Display for SymbolPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spot, self.perp)
    }
}

/// A single observed price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub price: Price,
    pub timestamp: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<Symbol>, price: Price, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}

/// Both legs of a pair sampled in one polling round.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTick {
    pub pair: SymbolPair,
    pub spot: PriceQuote,
    pub perp: PriceQuote,
}

impl PriceTick {
    /// Perp premium over spot in percent, `None` for a non-positive spot.
    #[must_use]
    pub fn spread_pct(&self) -> Option<Pct> {
        spread_pct(self.spot.price, self.perp.price)
    }

    /// Timestamp of the later of the two samples.
    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.spot.timestamp.max(self.perp.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tick_spread_and_timestamp() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::milliseconds(250);
        let tick = PriceTick {
            pair: SymbolPair::new("SOLUSDT", "SOLPERP"),
            spot: PriceQuote::new("SOLUSDT", dec!(100), t0),
            perp: PriceQuote::new("SOLPERP", dec!(100.2), t1),
        };

        assert_eq!(tick.spread_pct(), Some(dec!(0.2)));
        assert_eq!(tick.observed_at(), t1);
    }

    #[test]
    fn pair_display() {
        assert_eq!(SymbolPair::new("BTCUSDT", "BTCPERP").to_string(), "BTCUSDT/BTCPERP");
    }
}
