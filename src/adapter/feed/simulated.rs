//! Simulated perpetual prices derived from a spot feed.
//!
//! Each perp symbol maps to a spot symbol. A perp quote is the spot price
//! plus a random premium drawn from `[min_premium_pct, max_premium_pct]`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{pct_to_rate, Pct, PriceQuote, Symbol};
use crate::error::{ConfigError, Error, Result};
use crate::port::PriceFeed;

/// Premium resolution: 1/10_000 of a percent.
const PREMIUM_SCALE: u32 = 4;

/// Perp feed that adds a random premium to the paired spot price.
pub struct SimulatedPerpFeed {
    spot: Arc<dyn PriceFeed>,
    perp_to_spot: HashMap<Symbol, Symbol>,
    min_premium: i64,
    max_premium: i64,
}

impl SimulatedPerpFeed {
    /// Build a feed for the given `(spot, perp)` pairs.
    pub fn new(
        spot: Arc<dyn PriceFeed>,
        pairs: impl IntoIterator<Item = (Symbol, Symbol)>,
        min_premium_pct: Pct,
        max_premium_pct: Pct,
    ) -> Result<Self> {
        let scaled = |pct: Pct| {
            (pct * Decimal::from(10_i64.pow(PREMIUM_SCALE)))
                .round()
                .to_i64()
                .ok_or_else(|| {
                    Error::Config(ConfigError::InvalidValue {
                        field: "feed.simulated_premium",
                        reason: format!("{pct} is out of range"),
                    })
                })
        };
        let min_premium = scaled(min_premium_pct)?;
        let max_premium = scaled(max_premium_pct)?;
        if min_premium > max_premium {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "feed.simulated_premium",
                reason: format!("min {min_premium_pct} exceeds max {max_premium_pct}"),
            }));
        }

        Ok(Self {
            spot,
            perp_to_spot: pairs.into_iter().map(|(spot, perp)| (perp, spot)).collect(),
            min_premium,
            max_premium,
        })
    }

    fn draw_premium(&self) -> Pct {
        let raw = rand::thread_rng().gen_range(self.min_premium..=self.max_premium);
        Decimal::new(raw, PREMIUM_SCALE)
    }
}

#[async_trait]
impl PriceFeed for SimulatedPerpFeed {
    fn name(&self) -> &'static str {
        "simulated-perp"
    }

    async fn get_price(&self, symbol: &Symbol) -> Result<PriceQuote> {
        let spot_symbol = self
            .perp_to_spot
            .get(symbol)
            .ok_or_else(|| Error::FeedUnavailable {
                symbol: symbol.to_string(),
                reason: "no spot symbol mapped to this perp".into(),
            })?;

        let spot = self.spot.get_price(spot_symbol).await?;
        let premium = self.draw_premium();
        let price = spot.price * (Decimal::ONE + pct_to_rate(premium));
        Ok(PriceQuote::new(symbol.clone(), price, spot.timestamp))
    }
}
