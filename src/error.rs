use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::TradeId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Reasons the risk governor refuses a new trade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("in cooldown until {until}")]
    Cooldown { until: DateTime<Utc> },

    #[error("daily trade limit reached ({limit})")]
    DailyTradeLimit { limit: u32 },

    #[error("daily loss limit reached: {pnl} <= -{limit}")]
    DailyLossLimit { pnl: Decimal, limit: Decimal },

    #[error("exposure limit exceeded: {current} + {additional} > {limit}")]
    ExposureLimit {
        current: Decimal,
        additional: Decimal,
        limit: Decimal,
    },
}

/// Trade lifecycle errors returned by the ledger.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("insufficient balance: {available} < {required}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("open trade capacity exceeded: {open} >= {max}")]
    CapacityExceeded { open: usize, max: usize },

    #[error("risk blocked: {0}")]
    RiskBlocked(RiskError),

    #[error("trade {0} not found among open trades")]
    TradeNotFound(TradeId),
}

/// Snapshot persistence errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot schema version {found} (max supported {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("price feed unavailable for {symbol}: {reason}")]
    FeedUnavailable { symbol: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the failure is expected to clear on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FeedUnavailable { .. } | Self::Http(_) | Self::Persistence(_)
        )
    }
}
