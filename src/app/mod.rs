//! Application layer: configuration, orchestration and the runtime loop.

pub mod config;
mod monitor;
mod orchestrator;
mod runtime;

pub use config::{
    Config, ExitConfig, FeedConfig, FeesConfig, LoggingConfig, NotificationConfig, PairConfig,
    PerformanceConfig, PerpSource, RetryConfig, RiskConfig, StorageConfig, TradingConfig,
};
pub use monitor::{fetch_with_retry, monitor_pair, Feeds};
pub use orchestrator::{Orchestrator, QualityFilter, Stores, TickOutcome};
pub use runtime::{build_notifiers, App};
