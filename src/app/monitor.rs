//! Per-pair price polling tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::adapter::feed::{BinanceFeed, SimulatedPerpFeed};
use crate::app::config::{Config, PerpSource, RetryConfig};
use crate::domain::{PriceQuote, PriceTick, Symbol, SymbolPair};
use crate::error::Result;
use crate::port::PriceFeed;

/// Spot and perp price sources.
#[derive(Clone)]
pub struct Feeds {
    pub spot: Arc<dyn PriceFeed>,
    pub perp: Arc<dyn PriceFeed>,
}

impl Feeds {
    /// Build the feeds selected by `[feed]`.
    #[allow(clippy::result_large_err)]
    pub fn from_config(config: &Config) -> Result<Self> {
        let feed = &config.feed;
        let spot: Arc<dyn PriceFeed> =
            Arc::new(BinanceFeed::spot(&feed.spot_api_url, feed.request_timeout())?);

        let perp: Arc<dyn PriceFeed> = match feed.perp_source {
            PerpSource::Simulated => Arc::new(SimulatedPerpFeed::new(
                spot.clone(),
                config
                    .symbol_pairs()
                    .into_iter()
                    .map(|pair| (pair.spot, pair.perp)),
                feed.min_premium_pct,
                feed.max_premium_pct,
            )?),
            PerpSource::BinanceFutures => {
                Arc::new(BinanceFeed::futures(&feed.perp_api_url, feed.request_timeout())?)
            }
        };

        info!(spot = spot.name(), perp = perp.name(), "Price feeds ready");
        Ok(Self { spot, perp })
    }
}

/// Fetch a price, retrying transient failures with exponential backoff.
///
/// Returns `None` once the attempts are exhausted or the error is permanent.
pub async fn fetch_with_retry(
    feed: &dyn PriceFeed,
    symbol: &Symbol,
    retry: &RetryConfig,
) -> Option<PriceQuote> {
    for attempt in 1..=retry.max_attempts {
        match feed.get_price(symbol).await {
            Ok(quote) => return Some(quote),
            Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                let delay = retry.delay_for(attempt);
                warn!(
                    feed = feed.name(),
                    symbol = %symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Price fetch failed, retrying"
                );
                sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    feed = feed.name(),
                    symbol = %symbol,
                    error = %e,
                    "Price fetch failed, skipping tick"
                );
                return None;
            }
        }
    }
    None
}

async fn fetch_tick(feeds: &Feeds, pair: &SymbolPair, retry: &RetryConfig) -> Option<PriceTick> {
    let spot = fetch_with_retry(feeds.spot.as_ref(), &pair.spot, retry).await?;
    let perp = fetch_with_retry(feeds.perp.as_ref(), &pair.perp, retry).await?;
    Some(PriceTick {
        pair: pair.clone(),
        spot,
        perp,
    })
}

/// Poll one pair until `stop` flips or the receiver goes away.
///
/// The stop signal is raced against every fetch and sleep, so an in-flight
/// request is dropped rather than awaited.
pub async fn monitor_pair(
    pair: SymbolPair,
    feeds: Feeds,
    poll_interval: Duration,
    retry: RetryConfig,
    ticks: mpsc::Sender<PriceTick>,
    mut stop: watch::Receiver<bool>,
) {
    info!(pair = %pair, "Monitor started");

    while !*stop.borrow() {
        let tick = tokio::select! {
            _ = stop.changed() => break,
            tick = fetch_tick(&feeds, &pair, &retry) => tick,
        };

        if let Some(tick) = tick {
            debug!(pair = %pair, spread_pct = ?tick.spread_pct(), "Tick");
            tokio::select! {
                _ = stop.changed() => break,
                sent = ticks.send(tick) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        tokio::select! {
            _ = stop.changed() => break,
            () = sleep(poll_interval) => {}
        }
    }

    info!(pair = %pair, "Monitor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit::config::fast_retry;
    use crate::testkit::feed::ScriptedFeed;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let feed = ScriptedFeed::new()
            .with_price("SOLUSDT", dec!(100))
            .fail_next("SOLUSDT", 2);

        let quote = fetch_with_retry(&feed, &Symbol::from("SOLUSDT"), &fast_retry(3)).await;
        assert_eq!(quote.map(|q| q.price), Some(dec!(100)));
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let feed = ScriptedFeed::new()
            .with_price("SOLUSDT", dec!(100))
            .fail_next("SOLUSDT", 5);

        let quote = fetch_with_retry(&feed, &Symbol::from("SOLUSDT"), &fast_retry(3)).await;
        assert!(quote.is_none());
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test]
    async fn test_unknown_symbol_gives_up() {
        let feed = ScriptedFeed::new();
        let quote = fetch_with_retry(&feed, &Symbol::from("NOPE"), &fast_retry(2)).await;
        assert!(quote.is_none());
        assert_eq!(feed.calls(), 2);
        assert!(matches!(
            feed.get_price(&Symbol::from("NOPE")).await,
            Err(Error::FeedUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_monitor_pushes_ticks_and_stops() {
        let spot = ScriptedFeed::new().with_price("SOLUSDT", dec!(100));
        let perp = ScriptedFeed::new().with_price("SOLPERP", dec!(100.5));
        let feeds = Feeds {
            spot: Arc::new(spot),
            perp: Arc::new(perp),
        };
        let (tx, mut rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(monitor_pair(
            SymbolPair::new("SOLUSDT", "SOLPERP"),
            feeds,
            Duration::from_millis(5),
            fast_retry(1),
            tx,
            stop_rx,
        ));

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.spread_pct(), Some(dec!(0.5)));

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
