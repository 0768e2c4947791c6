//! Price feed adapters.

mod binance;
mod simulated;

pub use binance::BinanceFeed;
pub use simulated::SimulatedPerpFeed;
