//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`]: `ScriptedFeed`, an in-memory [`PriceFeed`](crate::port::PriceFeed)
//!   with settable prices and injectable failures.
//! - [`store`]: `MemoryStore`, snapshot stores that can be switched to fail.
//! - [`notifier`]: `RecordingNotifier`, captures every event it sees.
//! - [`config`]: Canonical test configurations.

pub mod config;
pub mod feed;
pub mod notifier;
pub mod store;
