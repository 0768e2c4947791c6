//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::app::{Config, PairConfig, RetryConfig};

/// Default configuration monitoring `SOLUSDT`/`SOLPERP`.
///
/// Entry threshold 0.20% (0.05 spread + 0.15 fees), quality bar 0.25%,
/// exit target 0.10%, $1000 trades from a $10,000 balance.
pub fn paper_config() -> Config {
    Config {
        pairs: vec![pair("SOLUSDT", "SOLPERP")],
        ..Config::default()
    }
}

/// A pair entry for `Config::pairs`.
pub fn pair(spot: &str, perp: &str) -> PairConfig {
    PairConfig {
        spot: spot.into(),
        perp: perp.into(),
    }
}

/// Retry config with zero delays, no waiting in tests.
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        initial_delay_ms: 0,
        max_delay_ms: 0,
        backoff_multiplier: 1.0,
        max_attempts,
    }
}
