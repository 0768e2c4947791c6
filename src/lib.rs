//! Spreadhound - spot/perpetual basis arbitrage detection with paper trading.
//!
//! Polls spot and perpetual prices for configured pairs, detects spreads
//! wide enough to clear fees, and simulates long-spot / short-perp trades
//! behind a risk governor while tracking session performance.
//!
//! # Modules
//!
//! - [`domain`] - Pure types and logic: detection, trades, the paper ledger
//! - [`service`] - Risk governor and performance tracker
//! - [`port`] - Traits for price feeds, snapshot stores and notifiers
//! - [`adapter`] - Binance and simulated feeds, JSON file store, webhook notifier
//! - [`app`] - Configuration, the per-tick orchestrator and the runtime loop
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Expose test doubles (scripted feed, memory store) to integration tests

pub mod adapter;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod port;
pub mod service;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
