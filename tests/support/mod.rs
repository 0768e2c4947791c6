#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use spreadhound::app::{Config, Orchestrator, Stores};
use spreadhound::domain::{PriceQuote, PriceTick, SymbolPair};
use spreadhound::port::NotifierRegistry;
use spreadhound::testkit::config::paper_config;
use spreadhound::testkit::notifier::RecordingNotifier;

/// A `SOLUSDT`/`SOLPERP` tick with both legs sampled at `at`.
pub fn tick(spot: Decimal, perp: Decimal, at: DateTime<Utc>) -> PriceTick {
    let pair = SymbolPair::new("SOLUSDT", "SOLPERP");
    PriceTick {
        spot: PriceQuote::new(pair.spot.clone(), spot, at),
        perp: PriceQuote::new(pair.perp.clone(), perp, at),
        pair,
    }
}

/// Fixed start time so date-sensitive counters are deterministic.
pub fn t0() -> DateTime<Utc> {
    "2026-03-02T12:00:00Z".parse().unwrap()
}

pub fn secs(n: i64) -> Duration {
    Duration::seconds(n)
}

/// Paper config that holds at most one trade at a time.
pub fn single_slot_config() -> Config {
    let mut config = paper_config();
    config.trading.max_open_trades = 1;
    config
}

/// Orchestrator with a recording notifier attached.
pub fn orchestrator_with(
    config: &Config,
    stores: Stores,
    now: DateTime<Utc>,
) -> (Orchestrator, RecordingNotifier) {
    let recorder = RecordingNotifier::new();
    let mut notifiers = NotifierRegistry::new();
    notifiers.register(Box::new(recorder.clone()));
    let orchestrator = Orchestrator::restore(config, stores, notifiers, now).unwrap();
    (orchestrator, recorder)
}

pub fn null_stores() -> Stores {
    Stores::null()
}

pub fn shared<S>(store: &Arc<S>) -> Stores
where
    S: spreadhound::port::LedgerStore + spreadhound::port::MetricsStore + 'static,
{
    Stores::shared(Arc::clone(store))
}

/// Write `contents` to `config.toml` in a fresh temp dir.
pub fn write_temp_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}
