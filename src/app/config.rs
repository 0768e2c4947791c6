//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Every field has a default, so an
//! empty file is a valid paper-trading setup. The webhook URL may instead come
//! from the `WEBHOOK_URL` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use crate::adapter::notifier::WebhookConfig;
use crate::domain::{DetectorConfig, ExitRules, ExitStrategy, LedgerConfig, SymbolPair};
use crate::error::{ConfigError, Result};
use crate::service::RiskLimits;

/// Environment variable holding the webhook URL.
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";

/// Upper bound for configured hold and snapshot periods (one year).
pub const MAX_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub fees: FeesConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<PairConfig>,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trading: TradingConfig::default(),
            fees: FeesConfig::default(),
            exit: ExitConfig::default(),
            risk: RiskConfig::default(),
            feed: FeedConfig::default(),
            pairs: default_pairs(),
            performance: PerformanceConfig::default(),
            storage: StorageConfig::default(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Entry and sizing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Spread above fees required to call something an opportunity (percent).
    #[serde(default = "default_min_spread_pct")]
    pub min_spread_pct: Decimal,
    /// Notional per trade in dollars.
    #[serde(default = "default_trade_size")]
    pub trade_size: Decimal,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    #[serde(default = "default_max_open_trades")]
    pub max_open_trades: usize,
    /// Opportunities below this expected profit are not traded.
    #[serde(default = "default_min_profit_threshold")]
    pub min_profit_threshold: Decimal,
    /// Extra spread over `min_spread_pct` required before trading (percent).
    #[serde(default = "default_quality_spread_margin_pct")]
    pub quality_spread_margin_pct: Decimal,
}

fn default_min_spread_pct() -> Decimal {
    Decimal::new(5, 2)
}

fn default_trade_size() -> Decimal {
    Decimal::from(1000)
}

fn default_initial_balance() -> Decimal {
    Decimal::from(10_000)
}

const fn default_max_open_trades() -> usize {
    3
}

fn default_min_profit_threshold() -> Decimal {
    Decimal::ONE
}

fn default_quality_spread_margin_pct() -> Decimal {
    Decimal::new(2, 1)
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_spread_pct: default_min_spread_pct(),
            trade_size: default_trade_size(),
            initial_balance: default_initial_balance(),
            max_open_trades: default_max_open_trades(),
            min_profit_threshold: default_min_profit_threshold(),
            quality_spread_margin_pct: default_quality_spread_margin_pct(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    /// Combined round-trip taker fee of both venues (percent).
    #[serde(default = "default_total_fee_pct")]
    pub total_fee_pct: Decimal,
}

fn default_total_fee_pct() -> Decimal {
    Decimal::new(15, 2)
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            total_fee_pct: default_total_fee_pct(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExitConfig {
    #[serde(default)]
    pub exit_strategy: ExitStrategy,
    #[serde(default = "default_target_spread_pct")]
    pub target_spread_pct: Decimal,
    #[serde(default = "default_stop_loss_usd")]
    pub stop_loss_usd: Decimal,
    #[serde(default = "default_take_profit_fraction")]
    pub take_profit_fraction: Decimal,
    #[serde(default = "default_max_hold_seconds")]
    pub max_hold_seconds: u64,
}

fn default_target_spread_pct() -> Decimal {
    Decimal::new(1, 1)
}

fn default_stop_loss_usd() -> Decimal {
    Decimal::from(2)
}

fn default_take_profit_fraction() -> Decimal {
    Decimal::new(5, 1)
}

const fn default_max_hold_seconds() -> u64 {
    60
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            exit_strategy: ExitStrategy::default(),
            target_spread_pct: default_target_spread_pct(),
            stop_loss_usd: default_stop_loss_usd(),
            take_profit_fraction: default_take_profit_fraction(),
            max_hold_seconds: default_max_hold_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_max_trades_per_day")]
    pub max_trades_per_day: u32,
    #[serde(default = "default_cooldown_after_losses")]
    pub cooldown_after_losses: u32,
    #[serde(default = "default_cooldown_duration_minutes")]
    pub cooldown_duration_minutes: u32,
    /// Realized daily loss in dollars that halts new trades.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Aggregate exposure ceiling as a multiple of `trade_size`.
    #[serde(default = "default_max_position_multiple")]
    pub max_position_multiple: Decimal,
}

const fn default_max_trades_per_day() -> u32 {
    50
}

const fn default_cooldown_after_losses() -> u32 {
    3
}

const fn default_cooldown_duration_minutes() -> u32 {
    30
}

fn default_max_daily_loss() -> Decimal {
    Decimal::from(500)
}

fn default_max_position_multiple() -> Decimal {
    Decimal::from(3)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_trades_per_day: default_max_trades_per_day(),
            cooldown_after_losses: default_cooldown_after_losses(),
            cooldown_duration_minutes: default_cooldown_duration_minutes(),
            max_daily_loss: default_max_daily_loss(),
            max_position_multiple: default_max_position_multiple(),
        }
    }
}

/// Where perpetual prices come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerpSource {
    /// Spot price plus a random premium.
    #[default]
    Simulated,
    /// Binance USD-M futures ticker.
    BinanceFutures,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_spot_api_url")]
    pub spot_api_url: String,
    #[serde(default)]
    pub perp_source: PerpSource,
    #[serde(default = "default_perp_api_url")]
    pub perp_api_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_min_premium_pct")]
    pub min_premium_pct: Decimal,
    #[serde(default = "default_max_premium_pct")]
    pub max_premium_pct: Decimal,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_spot_api_url() -> String {
    "https://api.binance.com".into()
}

fn default_perp_api_url() -> String {
    "https://fapi.binance.com".into()
}

const fn default_poll_interval_ms() -> u64 {
    2000
}

const fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_min_premium_pct() -> Decimal {
    Decimal::new(5, 2)
}

fn default_max_premium_pct() -> Decimal {
    Decimal::new(3, 1)
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            spot_api_url: default_spot_api_url(),
            perp_source: PerpSource::default(),
            perp_api_url: default_perp_api_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            min_premium_pct: default_min_premium_pct(),
            max_premium_pct: default_max_premium_pct(),
            retry: RetryConfig::default(),
        }
    }
}

impl FeedConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Backoff for failed price fetches.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between retries (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Attempts per fetch, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

const fn default_initial_delay_ms() -> u64 {
    1000
}

const fn default_max_delay_ms() -> u64 {
    10_000
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

const fn default_max_attempts() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

/// One monitored spot/perp pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PairConfig {
    pub spot: String,
    pub perp: String,
}

impl From<&PairConfig> for SymbolPair {
    fn from(pair: &PairConfig) -> Self {
        SymbolPair::new(pair.spot.as_str(), pair.perp.as_str())
    }
}

fn default_pairs() -> Vec<PairConfig> {
    vec![PairConfig {
        spot: "SOLUSDT".into(),
        perp: "SOL-PERP".into(),
    }]
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
    /// Opportunities kept in the detector's rolling history.
    #[serde(default = "default_opportunity_history")]
    pub opportunity_history: usize,
}

const fn default_snapshot_interval_secs() -> u64 {
    3600
}

const fn default_opportunity_history() -> usize {
    100
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval_secs(),
            opportunity_history: default_opportunity_history(),
        }
    }
}

impl PerformanceConfig {
    #[must_use]
    pub fn snapshot_interval(&self) -> chrono::Duration {
        period(self.snapshot_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Falls back to `WEBHOOK_URL` when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub notify_opportunities: bool,
    #[serde(default = "default_true")]
    pub notify_trades: bool,
    #[serde(default = "default_true")]
    pub notify_reports: bool,
}

fn default_username() -> String {
    "spreadhound".into()
}

const fn default_true() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            username: default_username(),
            notify_opportunities: false,
            notify_trades: true,
            notify_reports: true,
        }
    }
}

impl NotificationConfig {
    /// Webhook settings when notifications are enabled and a URL is known.
    #[must_use]
    pub fn webhook(&self) -> Option<WebhookConfig> {
        if !self.enabled {
            return None;
        }
        self.webhook_url.as_ref().map(|url| WebhookConfig {
            url: url.clone(),
            username: self.username.clone(),
            notify_opportunities: self.notify_opportunities,
            notify_trades: self.notify_trades,
            notify_reports: self.notify_reports,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load, apply environment overrides, and validate.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse(&content)?;
        if config.notifications.webhook_url.is_none() {
            config.notifications.webhook_url = std::env::var(WEBHOOK_URL_ENV).ok();
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without validating.
    #[allow(clippy::result_large_err)]
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::Parse)?)
    }

    /// Reject configurations that cannot trade sensibly.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        let trading = &self.trading;
        if trading.trade_size <= Decimal::ZERO {
            return Err(invalid("trading.trade_size", "must be positive"));
        }
        if trading.initial_balance <= Decimal::ZERO {
            return Err(invalid("trading.initial_balance", "must be positive"));
        }
        if trading.max_open_trades == 0 {
            return Err(invalid("trading.max_open_trades", "must be at least 1"));
        }
        if trading.min_spread_pct < Decimal::ZERO {
            return Err(invalid("trading.min_spread_pct", "must not be negative"));
        }
        if self.fees.total_fee_pct < Decimal::ZERO {
            return Err(invalid("fees.total_fee_pct", "must not be negative"));
        }

        let exit = &self.exit;
        if exit.take_profit_fraction <= Decimal::ZERO || exit.take_profit_fraction > Decimal::ONE {
            return Err(invalid("exit.take_profit_fraction", "must be in (0, 1]"));
        }
        if exit.stop_loss_usd < Decimal::ZERO {
            return Err(invalid("exit.stop_loss_usd", "must not be negative"));
        }
        if exit.max_hold_seconds > MAX_PERIOD_SECS {
            return Err(invalid(
                "exit.max_hold_seconds",
                format!("must not exceed {MAX_PERIOD_SECS}"),
            ));
        }
        let entry_threshold = trading.min_spread_pct + self.fees.total_fee_pct;
        if exit.exit_strategy == ExitStrategy::SpreadTarget && exit.target_spread_pct >= entry_threshold
        {
            return Err(invalid(
                "exit.target_spread_pct",
                format!("must be below the entry threshold {entry_threshold}"),
            ));
        }

        if self.risk.max_position_multiple <= Decimal::ZERO {
            return Err(invalid("risk.max_position_multiple", "must be positive"));
        }
        if self.risk.max_daily_loss <= Decimal::ZERO {
            return Err(invalid("risk.max_daily_loss", "must be positive"));
        }

        if self.pairs.is_empty() {
            return Err(ConfigError::MissingField { field: "pairs" }.into());
        }
        if self
            .pairs
            .iter()
            .any(|p| p.spot.trim().is_empty() || p.perp.trim().is_empty())
        {
            return Err(invalid("pairs", "symbols must not be empty"));
        }

        let feed = &self.feed;
        if feed.poll_interval_ms == 0 {
            return Err(invalid("feed.poll_interval_ms", "must be positive"));
        }
        if feed.request_timeout_ms == 0 {
            return Err(invalid("feed.request_timeout_ms", "must be positive"));
        }
        check_url("feed.spot_api_url", &feed.spot_api_url)?;
        if feed.perp_source == PerpSource::BinanceFutures {
            check_url("feed.perp_api_url", &feed.perp_api_url)?;
        }
        if feed.min_premium_pct > feed.max_premium_pct {
            return Err(invalid(
                "feed.min_premium_pct",
                format!("exceeds max_premium_pct {}", feed.max_premium_pct),
            ));
        }
        if feed.retry.max_attempts == 0 {
            return Err(invalid("feed.retry.max_attempts", "must be at least 1"));
        }
        if feed.retry.backoff_multiplier < 1.0 {
            return Err(invalid("feed.retry.backoff_multiplier", "must be at least 1.0"));
        }

        if self.performance.snapshot_interval_secs == 0 {
            return Err(invalid("performance.snapshot_interval_secs", "must be positive"));
        }
        if self.performance.snapshot_interval_secs > MAX_PERIOD_SECS {
            return Err(invalid(
                "performance.snapshot_interval_secs",
                format!("must not exceed {MAX_PERIOD_SECS}"),
            ));
        }

        if let Some(url) = &self.notifications.webhook_url {
            check_url("notifications.webhook_url", url)?;
        }

        Ok(())
    }

    #[must_use]
    pub fn symbol_pairs(&self) -> Vec<SymbolPair> {
        self.pairs.iter().map(SymbolPair::from).collect()
    }

    #[must_use]
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            min_spread_pct: self.trading.min_spread_pct,
            total_fee_pct: self.fees.total_fee_pct,
            trade_size: self.trading.trade_size,
            history_capacity: self.performance.opportunity_history,
        }
    }

    #[must_use]
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            initial_balance: self.trading.initial_balance,
            max_open_trades: self.trading.max_open_trades,
            total_fee_pct: self.fees.total_fee_pct,
            exit: ExitRules {
                strategy: self.exit.exit_strategy,
                target_spread_pct: self.exit.target_spread_pct,
                stop_loss_usd: self.exit.stop_loss_usd,
                take_profit_fraction: self.exit.take_profit_fraction,
                max_hold: period(self.exit.max_hold_seconds),
            },
        }
    }

    #[must_use]
    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            max_trades_per_day: self.risk.max_trades_per_day,
            cooldown_after_losses: self.risk.cooldown_after_losses,
            cooldown_duration: chrono::Duration::minutes(i64::from(
                self.risk.cooldown_duration_minutes,
            )),
            max_daily_loss: self.risk.max_daily_loss,
            max_position_size: self.trading.trade_size * self.risk.max_position_multiple,
        }
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
    .into()
}

/// Seconds as a chrono duration, clamped to `MAX_PERIOD_SECS`.
fn period(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(secs.min(MAX_PERIOD_SECS)).unwrap_or_default())
}

#[allow(clippy::result_large_err)]
fn check_url(field: &'static str, value: &str) -> Result<()> {
    Url::parse(value).map_err(|e| invalid(field, format!("{value:?}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        config.validate().unwrap();

        assert_eq!(config.trading.min_spread_pct, dec!(0.05));
        assert_eq!(config.trading.trade_size, dec!(1000));
        assert_eq!(config.trading.max_open_trades, 3);
        assert_eq!(config.fees.total_fee_pct, dec!(0.15));
        assert_eq!(config.exit.exit_strategy, ExitStrategy::SpreadTarget);
        assert_eq!(config.exit.max_hold_seconds, 60);
        assert_eq!(config.feed.perp_source, PerpSource::Simulated);
        assert_eq!(config.pairs.len(), 1);
        assert_eq!(config.performance.snapshot_interval_secs, 3600);
    }

    #[test]
    fn test_risk_limits_derive_exposure_cap() {
        let config = Config::parse("[trading]\ntrade_size = 500\n[risk]\nmax_position_multiple = 4\n")
            .unwrap();
        assert_eq!(config.risk_limits().max_position_size, dec!(2000));
    }

    #[test]
    fn test_rejects_target_at_entry_threshold() {
        let config = Config::parse("[exit]\ntarget_spread_pct = 0.2\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exit.target_spread_pct"));

        let config = Config::parse("[exit]\nexit_strategy = \"rules_only\"\ntarget_spread_pct = 0.2\n")
            .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        for toml in [
            "[trading]\ntrade_size = 0",
            "[trading]\ninitial_balance = -1",
            "[trading]\nmax_open_trades = 0",
            "[fees]\ntotal_fee_pct = -0.1",
            "[exit]\ntake_profit_fraction = 1.5",
            "pairs = []",
            "[feed]\npoll_interval_ms = 0",
            "[feed]\nspot_api_url = \"not a url\"",
            "[feed]\nmin_premium_pct = 0.5\nmax_premium_pct = 0.1",
            "[notifications]\nwebhook_url = \"::\"",
            "[exit]\nmax_hold_seconds = 9223372036854775807",
            "[performance]\nsnapshot_interval_secs = 9223372036854775807",
        ] {
            let config = Config::parse(toml).unwrap();
            assert!(config.validate().is_err(), "accepted: {toml}");
        }
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let retry = RetryConfig {
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
            max_attempts: 5,
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(350));
    }

    #[test]
    fn test_webhook_requires_enabled_and_url() {
        let mut notifications = NotificationConfig::default();
        notifications.webhook_url = Some("https://example.com/hook".into());
        assert!(notifications.webhook().is_none());

        notifications.enabled = true;
        let webhook = notifications.webhook().unwrap();
        assert!(webhook.notify_trades);
        assert!(!webhook.notify_opportunities);
    }

    #[test]
    fn test_ledger_config_conversion() {
        let config = Config::default();
        let ledger = config.ledger_config();
        assert_eq!(ledger.exit.max_hold, chrono::Duration::seconds(60));
        assert_eq!(ledger.round_trip_fee_rate(), dec!(0.0015));
    }

    #[test]
    fn test_huge_periods_clamp_instead_of_overflowing() {
        let config = Config::parse(
            "[exit]\nmax_hold_seconds = 9223372036854775807\n\
             [performance]\nsnapshot_interval_secs = 9223372036854775807\n",
        )
        .unwrap();
        let max = chrono::Duration::seconds(MAX_PERIOD_SECS as i64);
        assert_eq!(config.ledger_config().exit.max_hold, max);
        assert_eq!(config.performance.snapshot_interval(), max);
    }
}
