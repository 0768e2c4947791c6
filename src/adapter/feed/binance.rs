//! Binance REST ticker feed.
//!
//! Spot uses `GET /api/v3/ticker/price?symbol=...`, USD-M futures use
//! `GET /fapi/v1/ticker/price?symbol=...`. Both return `{symbol, price}` with the
//! price as a decimal string.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{PriceQuote, Symbol};
use crate::error::{Error, Result};
use crate::port::PriceFeed;

const SPOT_TICKER_PATH: &str = "/api/v3/ticker/price";
const FUTURES_TICKER_PATH: &str = "/fapi/v1/ticker/price";

#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// Ticker price feed backed by Binance's public REST API.
pub struct BinanceFeed {
    client: Client,
    base_url: String,
    ticker_path: &'static str,
    name: &'static str,
}

impl BinanceFeed {
    /// Spot market feed.
    pub fn spot(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::build(base_url, SPOT_TICKER_PATH, "binance-spot", timeout)
    }

    /// Perpetual futures feed.
    pub fn futures(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::build(base_url, FUTURES_TICKER_PATH, "binance-futures", timeout)
    }

    fn build(
        base_url: &str,
        ticker_path: &'static str,
        name: &'static str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ticker_path,
            name,
        })
    }

    fn ticker_url(&self, symbol: &Symbol) -> String {
        format!("{}{}?symbol={}", self.base_url, self.ticker_path, symbol)
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get_price(&self, symbol: &Symbol) -> Result<PriceQuote> {
        let url = self.ticker_url(symbol);
        let unavailable = |reason: String| Error::FeedUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| unavailable(e.to_string()))?;
        let ticker: TickerPrice = response
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed ticker: {e}")))?;

        debug!(feed = self.name, symbol = %ticker.symbol, price = %ticker.price, "Ticker");
        parse_price(symbol, &ticker.price)
    }
}

/// Parse a ticker price string into a quote stamped now.
fn parse_price(symbol: &Symbol, raw: &str) -> Result<PriceQuote> {
    let price = Decimal::from_str(raw).map_err(|e| Error::FeedUnavailable {
        symbol: symbol.to_string(),
        reason: format!("invalid price {raw:?}: {e}"),
    })?;
    if price <= Decimal::ZERO {
        return Err(Error::FeedUnavailable {
            symbol: symbol.to_string(),
            reason: format!("non-positive price {price}"),
        });
    }
    Ok(PriceQuote::new(symbol.clone(), price, Utc::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_urls() {
        let spot = BinanceFeed::spot("https://api.binance.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            spot.ticker_url(&Symbol::from("SOLUSDT")),
            "https://api.binance.com/api/v3/ticker/price?symbol=SOLUSDT"
        );

        let perp = BinanceFeed::futures("https://fapi.binance.com", Duration::from_secs(5)).unwrap();
        assert_eq!(
            perp.ticker_url(&Symbol::from("SOLUSDT")),
            "https://fapi.binance.com/fapi/v1/ticker/price?symbol=SOLUSDT"
        );
        assert_eq!(perp.name(), "binance-futures");
    }

    #[test]
    fn test_ticker_body_decodes() {
        let body = r#"{"symbol":"SOLUSDT","price":"142.31000000"}"#;
        let ticker: TickerPrice = serde_json::from_str(body).unwrap();
        let quote = parse_price(&Symbol::from("SOLUSDT"), &ticker.price).unwrap();
        assert_eq!(quote.price, dec!(142.31));
    }

    #[test]
    fn test_bad_prices_are_unavailable() {
        let symbol = Symbol::from("SOLUSDT");
        assert!(matches!(
            parse_price(&symbol, "abc"),
            Err(Error::FeedUnavailable { .. })
        ));
        assert!(matches!(
            parse_price(&symbol, "0"),
            Err(Error::FeedUnavailable { .. })
        ));
    }
}
