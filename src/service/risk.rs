//! Risk governor.
//!
//! Gates new trades on cooldown, daily trade count, daily realized loss and
//! aggregate exposure, and tracks trade results to drive loss-streak cooldowns.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{TradeGate, Usd};
use crate::error::RiskError;

/// Risk limits.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    pub max_trades_per_day: u32,
    pub cooldown_after_losses: u32,
    pub cooldown_duration: Duration,
    /// Realized daily loss (positive dollars) that halts new trades.
    pub max_daily_loss: Usd,
    /// Aggregate open exposure ceiling.
    pub max_position_size: Usd,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_trades_per_day: 50,
            cooldown_after_losses: 3,
            cooldown_duration: Duration::minutes(30),
            max_daily_loss: Decimal::from(500),
            max_position_size: Decimal::from(3000),
        }
    }
}

/// Result of a risk check.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskCheck {
    /// Trade is allowed to proceed.
    Approved,
    /// Trade is rejected with reason.
    Rejected(RiskError),
}

impl RiskCheck {
    /// Check if approved.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Get rejection error if rejected.
    #[must_use]
    pub fn rejection(&self) -> Option<&RiskError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Approved => None,
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Approved => "trade allowed".to_string(),
            Self::Rejected(e) => e.to_string(),
        }
    }
}

/// Mutable risk counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub daily_trade_count: u32,
    pub daily_realized_pnl: Usd,
    pub consecutive_losses: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// Coarse risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time view of the governor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskStatus {
    pub level: RiskLevel,
    pub daily_trade_count: u32,
    pub daily_realized_pnl: Usd,
    pub consecutive_losses: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub trading_allowed: bool,
    pub warnings: Vec<String>,
}

/// Stateful trade gate.
#[derive(Debug)]
pub struct RiskGovernor {
    limits: RiskLimits,
    state: RiskState,
}

impl RiskGovernor {
    #[must_use]
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: RiskState::default(),
        }
    }

    #[must_use]
    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    #[must_use]
    pub fn state(&self) -> &RiskState {
        &self.state
    }

    /// Check whether a trade of `size` may be opened.
    #[must_use]
    pub fn check(&self, size: Usd, open_exposure: Usd, now: DateTime<Utc>) -> RiskCheck {
        match self.evaluate(size, open_exposure, now) {
            Ok(()) => RiskCheck::Approved,
            Err(e) => RiskCheck::Rejected(e),
        }
    }

    fn evaluate(&self, size: Usd, open_exposure: Usd, now: DateTime<Utc>) -> Result<(), RiskError> {
        self.check_cooldown(now)?;
        self.check_daily_trades()?;
        self.check_daily_loss()?;
        self.check_exposure(size, open_exposure)?;
        Ok(())
    }

    fn check_cooldown(&self, now: DateTime<Utc>) -> Result<(), RiskError> {
        match self.state.cooldown_until {
            Some(until) if now < until => Err(RiskError::Cooldown { until }),
            _ => Ok(()),
        }
    }

    fn check_daily_trades(&self) -> Result<(), RiskError> {
        if self.state.daily_trade_count >= self.limits.max_trades_per_day {
            return Err(RiskError::DailyTradeLimit {
                limit: self.limits.max_trades_per_day,
            });
        }
        Ok(())
    }

    fn check_daily_loss(&self) -> Result<(), RiskError> {
        let pnl = self.state.daily_realized_pnl;
        if pnl < Decimal::ZERO && -pnl >= self.limits.max_daily_loss {
            return Err(RiskError::DailyLossLimit {
                pnl,
                limit: self.limits.max_daily_loss,
            });
        }
        Ok(())
    }

    fn check_exposure(&self, size: Usd, open_exposure: Usd) -> Result<(), RiskError> {
        if open_exposure + size > self.limits.max_position_size {
            warn!(
                current = %open_exposure,
                additional = %size,
                limit = %self.limits.max_position_size,
                "Exposure limit would be exceeded"
            );
            return Err(RiskError::ExposureLimit {
                current: open_exposure,
                additional: size,
                limit: self.limits.max_position_size,
            });
        }
        Ok(())
    }

    /// Record a closed trade's realized profit.
    ///
    /// Returns the cooldown deadline if this result started a cooldown.
    pub fn record_trade_result(
        &mut self,
        profit: Usd,
        size: Usd,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        self.state.daily_trade_count += 1;
        self.state.daily_realized_pnl += profit;

        if profit >= Decimal::ZERO {
            self.state.consecutive_losses = 0;
            return None;
        }

        self.state.consecutive_losses += 1;
        if self.state.consecutive_losses < self.limits.cooldown_after_losses {
            return None;
        }

        let until = now + self.limits.cooldown_duration;
        self.state.cooldown_until = Some(until);
        warn!(
            consecutive_losses = self.state.consecutive_losses,
            last_size = %size,
            until = %until,
            "Entering cooldown"
        );
        Some(until)
    }

    /// Clear the daily counters. Driven by the day-boundary scheduler.
    pub fn reset_daily(&mut self) {
        info!(
            trades = self.state.daily_trade_count,
            pnl = %self.state.daily_realized_pnl,
            "Resetting daily risk limits"
        );
        self.state.daily_trade_count = 0;
        self.state.daily_realized_pnl = Decimal::ZERO;
        self.state.consecutive_losses = 0;
    }

    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> RiskStatus {
        let loss = (-self.state.daily_realized_pnl).max(Decimal::ZERO);
        let limit = self.limits.max_daily_loss;

        let level = if loss > limit * Decimal::new(8, 1) {
            RiskLevel::Critical
        } else if loss > limit * Decimal::new(5, 1) {
            RiskLevel::High
        } else if self.state.consecutive_losses >= 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let mut warnings = Vec::new();
        if Decimal::from(self.state.daily_trade_count)
            > Decimal::from(self.limits.max_trades_per_day) * Decimal::new(8, 1)
        {
            warnings.push("approaching daily trade limit".to_string());
        }
        if loss > limit * Decimal::new(5, 1) {
            warnings.push(format!("high daily loss: {}", self.state.daily_realized_pnl));
        }

        RiskStatus {
            level,
            daily_trade_count: self.state.daily_trade_count,
            daily_realized_pnl: self.state.daily_realized_pnl,
            consecutive_losses: self.state.consecutive_losses,
            cooldown_until: self.state.cooldown_until,
            trading_allowed: self.check_cooldown(now).is_ok()
                && self.check_daily_trades().is_ok()
                && self.check_daily_loss().is_ok(),
            warnings,
        }
    }
}

impl TradeGate for RiskGovernor {
    fn check_trade_allowed(
        &self,
        size: Usd,
        open_exposure: Usd,
        now: DateTime<Utc>,
    ) -> Result<(), RiskError> {
        self.evaluate(size, open_exposure, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn governor() -> RiskGovernor {
        RiskGovernor::new(RiskLimits {
            max_trades_per_day: 5,
            cooldown_after_losses: 2,
            cooldown_duration: Duration::minutes(30),
            max_daily_loss: dec!(10),
            max_position_size: dec!(3000),
        })
    }

    #[test]
    fn test_check_approved() {
        let risk = governor();
        assert!(risk.check(dec!(1000), dec!(0), Utc::now()).is_approved());
    }

    #[test]
    fn test_exposure_limit() {
        let risk = governor();
        let now = Utc::now();

        assert!(risk.check(dec!(1000), dec!(2000), now).is_approved());
        let result = risk.check(dec!(1000), dec!(2001), now);
        assert!(matches!(
            result.rejection(),
            Some(RiskError::ExposureLimit { .. })
        ));
    }

    #[test]
    fn test_daily_trade_limit() {
        let mut risk = governor();
        let now = Utc::now();
        for _ in 0..5 {
            risk.record_trade_result(dec!(1), dec!(1000), now);
        }

        let result = risk.check(dec!(1000), dec!(0), now);
        assert_eq!(
            result.rejection(),
            Some(&RiskError::DailyTradeLimit { limit: 5 })
        );
    }

    #[test]
    fn test_daily_loss_limit_blocks_losses_only() {
        let mut risk = RiskGovernor::new(RiskLimits {
            cooldown_after_losses: 10,
            ..governor().limits().clone()
        });
        let now = Utc::now();

        risk.record_trade_result(dec!(25), dec!(1000), now);
        assert!(risk.check(dec!(1000), dec!(0), now).is_approved());

        risk.record_trade_result(dec!(-35), dec!(1000), now);
        assert!(matches!(
            risk.check(dec!(1000), dec!(0), now).rejection(),
            Some(RiskError::DailyLossLimit { .. })
        ));
    }

    #[test]
    fn test_cooldown_after_consecutive_losses() {
        let mut risk = governor();
        let now = Utc::now();

        assert!(risk.record_trade_result(dec!(-1), dec!(1000), now).is_none());
        let until = risk.record_trade_result(dec!(-1), dec!(1000), now).unwrap();
        assert_eq!(until, now + Duration::minutes(30));

        assert!(matches!(
            risk.check(dec!(1000), dec!(0), now + Duration::minutes(29)).rejection(),
            Some(RiskError::Cooldown { .. })
        ));
        assert!(risk
            .check(dec!(1000), dec!(0), now + Duration::minutes(30))
            .is_approved());
    }

    #[test]
    fn test_win_resets_loss_streak() {
        let mut risk = governor();
        let now = Utc::now();

        risk.record_trade_result(dec!(-1), dec!(1000), now);
        risk.record_trade_result(dec!(0), dec!(1000), now);
        assert_eq!(risk.state().consecutive_losses, 0);
        assert!(risk.record_trade_result(dec!(-1), dec!(1000), now).is_none());
        assert!(risk.state().cooldown_until.is_none());
    }

    #[test]
    fn test_reset_daily() {
        let mut risk = governor();
        let now = Utc::now();
        risk.record_trade_result(dec!(-3), dec!(1000), now);
        risk.reset_daily();

        assert_eq!(risk.state().daily_trade_count, 0);
        assert_eq!(risk.state().daily_realized_pnl, Decimal::ZERO);
        assert_eq!(risk.state().consecutive_losses, 0);
    }

    #[test]
    fn test_status_levels() {
        let mut risk = governor();
        let now = Utc::now();
        assert_eq!(risk.status(now).level, RiskLevel::Low);

        risk.record_trade_result(dec!(-1), dec!(1000), now);
        risk.record_trade_result(dec!(-1), dec!(1000), now);
        let status = risk.status(now);
        assert_eq!(status.level, RiskLevel::Medium);
        assert!(!status.trading_allowed);

        risk.record_trade_result(dec!(-7), dec!(1000), now);
        let status = risk.status(now);
        assert_eq!(status.level, RiskLevel::Critical);
        assert!(!status.warnings.is_empty());
    }

    #[test]
    fn test_gate_trait_matches_check() {
        let risk = governor();
        let gate: &dyn TradeGate = &risk;
        assert!(gate
            .check_trade_allowed(dec!(1000), dec!(2500), Utc::now())
            .is_err());
    }
}
