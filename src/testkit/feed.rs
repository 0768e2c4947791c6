//! In-memory price feed for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{Price, PriceQuote, Symbol};
use crate::error::{Error, Result};
use crate::port::PriceFeed;

/// A feed serving fixed prices that tests can move at any time.
///
/// Unknown symbols fail with `FeedUnavailable`. `fail_next` makes the
/// next `n` requests for a symbol fail before prices are served again.
#[derive(Default)]
pub struct ScriptedFeed {
    prices: Mutex<HashMap<Symbol, Price>>,
    failures: Mutex<HashMap<Symbol, u32>>,
    calls: AtomicU32,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_price(self, symbol: &str, price: Price) -> Self {
        self.set_price(symbol, price);
        self
    }

    #[must_use]
    pub fn fail_next(self, symbol: &str, times: u32) -> Self {
        self.failures.lock().insert(Symbol::from(symbol), times);
        self
    }

    pub fn set_price(&self, symbol: &str, price: Price) {
        self.prices.lock().insert(Symbol::from(symbol), price);
    }

    /// Total `get_price` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn get_price(&self, symbol: &Symbol) -> Result<PriceQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(remaining) = self.failures.lock().get_mut(symbol) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(unavailable(symbol, "scripted failure"));
            }
        }

        let price = self.prices.lock().get(symbol).copied();
        price
            .map(|price| PriceQuote::new(symbol.clone(), price, Utc::now()))
            .ok_or_else(|| unavailable(symbol, "no scripted price"))
    }
}

fn unavailable(symbol: &Symbol, reason: &str) -> Error {
    Error::FeedUnavailable {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}
