//! Running profitability metrics.
//!
//! The tracker consumes opportunity and trade events plus balance updates. It
//! keeps derived ratios current after every update, a ring of periodic
//! snapshots, and can produce a [`ProfitabilityReport`] on demand.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{MathematicalOps, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::risk::RiskStatus;
use crate::domain::{OpportunitySummary, Pct, Usd};

/// Current metrics snapshot schema.
pub const METRICS_SCHEMA_VERSION: u32 = 1;

/// Periodic snapshots retained (one week of hourly snapshots).
pub const SNAPSHOT_CAPACITY: usize = 168;

/// Balance samples retained for the return series.
pub const BALANCE_HISTORY_CAPACITY: usize = 1_000;

const DAYS_PER_YEAR: u32 = 365;

/// Key performance indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_opportunities: u64,
    pub total_trades: u64,
    pub profitable_trades: u64,
    pub losing_trades: u64,

    pub total_gross_profit: Usd,
    pub total_fees_paid: Usd,
    pub total_net_profit: Usd,
    /// Sum of winning trade profits.
    pub total_wins: Usd,
    /// Sum of losing trade losses, as a positive number.
    pub total_losses: Usd,
    pub largest_win: Usd,
    /// Most negative trade profit (zero until a loss occurs).
    pub largest_loss: Usd,

    pub win_rate: Pct,
    pub profit_factor: Decimal,
    pub average_profit_per_trade: Usd,
    pub roi_percentage: Pct,
    pub max_drawdown: Pct,
    pub current_drawdown: Pct,
    pub sharpe_like_ratio: Decimal,

    pub runtime_hours: Decimal,
    pub trades_per_hour: Decimal,
    pub opportunities_per_hour: Decimal,

    pub peak_balance: Usd,
    pub current_balance: Usd,
}

/// Periodic point-in-time copy of the metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicSnapshot {
    pub timestamp: DateTime<Utc>,
    pub metrics: PerformanceMetrics,
    pub balance: Usd,
}

/// Persisted form of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub schema_version: u32,
    pub metrics: PerformanceMetrics,
    pub hourly_snapshots: Vec<PeriodicSnapshot>,
    pub balance_history: Vec<Usd>,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Actionable hint derived from the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Unprofitable,
    Profitable,
    RaiseSpreadThreshold,
    LowerSpreadThreshold,
    LowTradeFrequency,
    HighTradeFrequency,
    HighDrawdown,
    FeesDominateProfit,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unprofitable => "Currently unprofitable. Consider adjusting spread thresholds.",
            Self::Profitable => "Profitable. The current strategy is working.",
            Self::RaiseSpreadThreshold => "Low win rate. Consider raising the minimum spread threshold.",
            Self::LowerSpreadThreshold => {
                "High win rate. A lower spread threshold may surface more opportunities."
            }
            Self::LowTradeFrequency => {
                "Low trade frequency. Consider monitoring more pairs or lowering thresholds."
            }
            Self::HighTradeFrequency => {
                "High trade frequency. Watch for slippage and execution issues."
            }
            Self::HighDrawdown => "High drawdown detected. Tighten risk limits.",
            Self::FeesDominateProfit => "Fees consume over half of gross profit. Consider larger trade sizes.",
        };
        f.write_str(s)
    }
}

/// Headline numbers of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub is_profitable: bool,
    pub total_net_profit: Usd,
    pub roi_percentage: Pct,
    pub runtime_hours: Decimal,
}

/// Profitability report with projections and recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub profit_per_hour: Usd,
    pub projected_monthly_profit: Usd,
    pub break_even_trades: u64,
    pub risk_adjusted_return: Decimal,
    pub recommendations: Vec<Recommendation>,
    pub metrics: PerformanceMetrics,
    /// Detector history. Attached by the orchestrator, absent when rebuilt
    /// from a metrics snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunities: Option<OpportunitySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskStatus>,
}

/// Derive recommendations from metrics alone.
#[must_use]
pub fn recommendations(metrics: &PerformanceMetrics) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if metrics.total_net_profit < Decimal::ZERO {
        out.push(Recommendation::Unprofitable);
    } else {
        out.push(Recommendation::Profitable);
    }

    if metrics.total_trades > 0 {
        if metrics.win_rate < Decimal::from(40) {
            out.push(Recommendation::RaiseSpreadThreshold);
        } else if metrics.win_rate > Decimal::from(70) {
            out.push(Recommendation::LowerSpreadThreshold);
        }
    }

    if metrics.runtime_hours >= Decimal::ONE {
        if metrics.trades_per_hour < Decimal::new(5, 1) {
            out.push(Recommendation::LowTradeFrequency);
        } else if metrics.trades_per_hour > Decimal::from(5) {
            out.push(Recommendation::HighTradeFrequency);
        }
    }

    if metrics.max_drawdown > Decimal::TEN {
        out.push(Recommendation::HighDrawdown);
    }

    if metrics.total_fees_paid > metrics.total_gross_profit.abs() * Decimal::new(5, 1) {
        out.push(Recommendation::FeesDominateProfit);
    }

    out
}

/// Tracks performance for one session.
#[derive(Debug)]
pub struct PerformanceTracker {
    initial_balance: Usd,
    started_at: DateTime<Utc>,
    metrics: PerformanceMetrics,
    snapshots: VecDeque<PeriodicSnapshot>,
    balance_history: VecDeque<Usd>,
}

impl PerformanceTracker {
    #[must_use]
    pub fn new(initial_balance: Usd, started_at: DateTime<Utc>) -> Self {
        let metrics = PerformanceMetrics {
            peak_balance: initial_balance,
            current_balance: initial_balance,
            ..PerformanceMetrics::default()
        };
        let mut balance_history = VecDeque::with_capacity(BALANCE_HISTORY_CAPACITY);
        balance_history.push_back(initial_balance);

        Self {
            initial_balance,
            started_at,
            metrics,
            snapshots: VecDeque::with_capacity(SNAPSHOT_CAPACITY),
            balance_history,
        }
    }

    /// Rebuild a tracker from a persisted snapshot.
    #[must_use]
    pub fn restore(initial_balance: Usd, snapshot: MetricsSnapshot) -> Self {
        let mut snapshots: VecDeque<_> = snapshot.hourly_snapshots.into();
        while snapshots.len() > SNAPSHOT_CAPACITY {
            snapshots.pop_front();
        }
        let mut balance_history: VecDeque<_> = snapshot.balance_history.into();
        while balance_history.len() > BALANCE_HISTORY_CAPACITY {
            balance_history.pop_front();
        }
        if balance_history.is_empty() {
            balance_history.push_back(snapshot.metrics.current_balance);
        }

        Self {
            initial_balance,
            started_at: snapshot.started_at,
            metrics: snapshot.metrics,
            snapshots,
            balance_history,
        }
    }

    #[must_use]
    pub fn to_snapshot(&self, now: DateTime<Utc>) -> MetricsSnapshot {
        MetricsSnapshot {
            schema_version: METRICS_SCHEMA_VERSION,
            metrics: self.metrics.clone(),
            hourly_snapshots: self.snapshots.iter().cloned().collect(),
            balance_history: self.balance_history.iter().copied().collect(),
            started_at: self.started_at,
            last_updated: now,
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &PeriodicSnapshot> {
        self.snapshots.iter()
    }

    pub fn balance_history(&self) -> impl Iterator<Item = &Usd> {
        self.balance_history.iter()
    }

    pub fn record_opportunity(&mut self, now: DateTime<Utc>) {
        self.metrics.total_opportunities += 1;
        self.update_time_metrics(now);
    }

    /// Record a closed trade's net profit and the fees it paid.
    pub fn record_trade(&mut self, net_profit: Usd, fees: Usd, now: DateTime<Utc>) {
        let m = &mut self.metrics;
        m.total_trades += 1;
        m.total_fees_paid += fees;
        m.total_net_profit += net_profit;
        m.total_gross_profit += net_profit + fees;

        if net_profit > Decimal::ZERO {
            m.profitable_trades += 1;
            m.total_wins += net_profit;
            m.largest_win = m.largest_win.max(net_profit);
        } else if net_profit < Decimal::ZERO {
            m.losing_trades += 1;
            m.total_losses += -net_profit;
            m.largest_loss = m.largest_loss.min(net_profit);
        }

        let trades = Decimal::from(m.total_trades);
        m.win_rate = Decimal::from(m.profitable_trades) / trades * Decimal::ONE_HUNDRED;
        m.average_profit_per_trade = m.total_net_profit / trades;
        m.profit_factor = if m.total_losses > Decimal::ZERO {
            m.total_wins / m.total_losses
        } else {
            m.total_wins
        };

        debug!(
            net_profit = %net_profit,
            fees = %fees,
            total_trades = m.total_trades,
            win_rate = %m.win_rate.round_dp(2),
            "Recorded trade"
        );
        self.update_time_metrics(now);
    }

    /// Feed a new balance (equity) sample.
    pub fn update_balance(&mut self, balance: Usd) {
        if self.balance_history.len() == BALANCE_HISTORY_CAPACITY {
            self.balance_history.pop_front();
        }
        self.balance_history.push_back(balance);

        let m = &mut self.metrics;
        m.current_balance = balance;
        if balance > m.peak_balance {
            m.peak_balance = balance;
        }
        if m.peak_balance > Decimal::ZERO {
            m.current_drawdown = (m.peak_balance - balance) / m.peak_balance * Decimal::ONE_HUNDRED;
            m.max_drawdown = m.max_drawdown.max(m.current_drawdown);
        }
        if self.initial_balance > Decimal::ZERO {
            m.roi_percentage =
                (balance - self.initial_balance) / self.initial_balance * Decimal::ONE_HUNDRED;
        }

        if let Some(sharpe) = sharpe_like_ratio(&self.balance_history) {
            self.metrics.sharpe_like_ratio = sharpe;
        }
    }

    /// Append a periodic snapshot, evicting the oldest past capacity.
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> &PeriodicSnapshot {
        self.update_time_metrics(now);
        if self.snapshots.len() == SNAPSHOT_CAPACITY {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(PeriodicSnapshot {
            timestamp: now,
            metrics: self.metrics.clone(),
            balance: self.metrics.current_balance,
        });
        let len = self.snapshots.len();
        &self.snapshots[len - 1]
    }

    #[must_use]
    pub fn report(&mut self, now: DateTime<Utc>) -> ProfitabilityReport {
        self.update_time_metrics(now);
        let m = &self.metrics;

        let profit_per_hour = m.total_net_profit / m.runtime_hours.max(Decimal::ONE);
        let projected_monthly_profit = if m.runtime_hours > Decimal::ZERO {
            m.total_net_profit / m.runtime_hours * Decimal::from(24 * 30)
        } else {
            Decimal::ZERO
        };

        let break_even_trades = if m.average_profit_per_trade > Decimal::ZERO
            && m.total_net_profit < Decimal::ZERO
        {
            (m.total_net_profit.abs() / m.average_profit_per_trade)
                .floor()
                .to_u64()
                .map_or(0, |n| n + 1)
        } else {
            0
        };

        ProfitabilityReport {
            generated_at: now,
            summary: ReportSummary {
                is_profitable: m.total_net_profit > Decimal::ZERO,
                total_net_profit: m.total_net_profit.round_dp(2),
                roi_percentage: m.roi_percentage.round_dp(2),
                runtime_hours: m.runtime_hours.round_dp(2),
            },
            profit_per_hour: profit_per_hour.round_dp(2),
            projected_monthly_profit: projected_monthly_profit.round_dp(2),
            break_even_trades,
            risk_adjusted_return: (m.sharpe_like_ratio * m.roi_percentage).round_dp(2),
            recommendations: recommendations(m),
            metrics: m.clone(),
            opportunities: None,
            risk: None,
        }
    }

    fn update_time_metrics(&mut self, now: DateTime<Utc>) {
        let millis = (now - self.started_at).num_milliseconds().max(0);
        let hours = Decimal::from(millis) / Decimal::from(3_600_000);
        let m = &mut self.metrics;
        m.runtime_hours = hours;
        if hours > Decimal::ZERO {
            m.trades_per_hour = Decimal::from(m.total_trades) / hours;
            m.opportunities_per_hour = Decimal::from(m.total_opportunities) / hours;
        }
    }
}

/// Annualised mean/stdev ratio of successive balance returns.
///
/// Needs at least three balances and a non-zero deviation.
fn sharpe_like_ratio(balances: &VecDeque<Usd>) -> Option<Decimal> {
    if balances.len() < 3 {
        return None;
    }

    let returns: Vec<Decimal> = balances
        .iter()
        .zip(balances.iter().skip(1))
        .filter(|(prev, _)| !prev.is_zero())
        .map(|(prev, next)| (next - prev) / prev)
        .collect();
    if returns.is_empty() {
        return None;
    }

    let n = Decimal::from(returns.len());
    let mean = returns.iter().sum::<Decimal>() / n;
    let variance = returns
        .iter()
        .map(|r| (r - mean) * (r - mean))
        .sum::<Decimal>()
        / n;
    let std = variance.sqrt()?;
    if std.is_zero() {
        return None;
    }

    let days = Decimal::from(DAYS_PER_YEAR);
    Some(mean * days / (std * days.sqrt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn tracker() -> (PerformanceTracker, DateTime<Utc>) {
        let start = Utc::now();
        (PerformanceTracker::new(dec!(10000), start), start)
    }

    #[test]
    fn test_drawdown_tracks_peak() {
        let (mut tracker, _) = tracker();
        for balance in [dec!(10000), dec!(10500), dec!(9800)] {
            tracker.update_balance(balance);
        }

        let m = tracker.metrics();
        assert_eq!(m.peak_balance, dec!(10500));
        assert_eq!(m.current_drawdown.round_dp(2), dec!(6.67));
        assert_eq!(m.max_drawdown, m.current_drawdown);
        assert_eq!(m.roi_percentage, dec!(-2));
    }

    #[test]
    fn test_peak_never_decreases() {
        let (mut tracker, _) = tracker();
        let mut last_peak = tracker.metrics().peak_balance;
        for balance in [dec!(9000), dec!(11000), dec!(10000), dec!(12000), dec!(500)] {
            tracker.update_balance(balance);
            assert!(tracker.metrics().peak_balance >= last_peak);
            assert!(tracker.metrics().peak_balance >= balance);
            last_peak = tracker.metrics().peak_balance;
        }
    }

    #[test]
    fn test_record_trade_counters() {
        let (mut tracker, start) = tracker();
        let now = start + Duration::minutes(30);
        tracker.record_trade(dec!(3.5), dec!(1.5), now);
        tracker.record_trade(dec!(-2), dec!(1.5), now);
        tracker.record_trade(dec!(0), dec!(1.5), now);

        let m = tracker.metrics();
        assert_eq!(m.total_trades, 3);
        assert_eq!(m.profitable_trades, 1);
        assert_eq!(m.losing_trades, 1);
        assert_eq!(m.total_net_profit, dec!(1.5));
        assert_eq!(m.total_fees_paid, dec!(4.5));
        assert_eq!(m.total_gross_profit, dec!(6.0));
        assert_eq!(m.largest_win, dec!(3.5));
        assert_eq!(m.largest_loss, dec!(-2));
        assert_eq!(m.profit_factor, dec!(1.75));
        assert_eq!(m.average_profit_per_trade, dec!(0.5));
        assert_eq!(m.trades_per_hour, dec!(6));
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let (mut tracker, start) = tracker();
        tracker.record_trade(dec!(2), dec!(1), start);
        tracker.record_trade(dec!(3), dec!(1), start);
        assert_eq!(tracker.metrics().profit_factor, dec!(5));
        assert_eq!(tracker.metrics().win_rate, dec!(100));
    }

    #[test]
    fn test_sharpe_needs_three_balances() {
        let (mut tracker, _) = tracker();
        tracker.update_balance(dec!(10100));
        assert_eq!(tracker.metrics().sharpe_like_ratio, Decimal::ZERO);

        tracker.update_balance(dec!(10150));
        assert!(tracker.metrics().sharpe_like_ratio > Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_ring_is_bounded() {
        let (mut tracker, start) = tracker();
        for i in 0..(SNAPSHOT_CAPACITY as i64 + 5) {
            tracker.snapshot(start + Duration::hours(i));
        }

        assert_eq!(tracker.snapshots().count(), SNAPSHOT_CAPACITY);
        assert_eq!(
            tracker.snapshots().next().unwrap().timestamp,
            start + Duration::hours(5)
        );
    }

    #[test]
    fn test_report_projection() {
        let (mut tracker, start) = tracker();
        tracker.record_trade(dec!(4), dec!(1.5), start);
        tracker.update_balance(dec!(10004));

        let report = tracker.report(start + Duration::hours(2));
        assert!(report.summary.is_profitable);
        assert_eq!(report.summary.runtime_hours, dec!(2));
        assert_eq!(report.profit_per_hour, dec!(2));
        assert_eq!(report.projected_monthly_profit, dec!(1440));
        assert_eq!(report.break_even_trades, 0);
        assert!(report.recommendations.contains(&Recommendation::Profitable));
    }

    #[test]
    fn test_break_even_trades() {
        let (mut tracker, start) = tracker();
        let metrics = &mut tracker.metrics;
        metrics.total_trades = 4;
        metrics.total_net_profit = dec!(-5);
        metrics.average_profit_per_trade = dec!(2);

        let report = tracker.report(start);
        assert_eq!(report.break_even_trades, 3);
    }

    #[test]
    fn test_recommendations_rules() {
        let metrics = PerformanceMetrics {
            total_trades: 10,
            total_net_profit: dec!(-3),
            win_rate: dec!(30),
            runtime_hours: dec!(2),
            trades_per_hour: dec!(6),
            max_drawdown: dec!(12),
            total_gross_profit: dec!(4),
            total_fees_paid: dec!(7),
            ..PerformanceMetrics::default()
        };

        assert_eq!(
            recommendations(&metrics),
            vec![
                Recommendation::Unprofitable,
                Recommendation::RaiseSpreadThreshold,
                Recommendation::HighTradeFrequency,
                Recommendation::HighDrawdown,
                Recommendation::FeesDominateProfit,
            ]
        );
    }

    #[test]
    fn test_recommendations_skip_rate_rules_early() {
        let metrics = PerformanceMetrics {
            runtime_hours: dec!(0.5),
            ..PerformanceMetrics::default()
        };
        assert_eq!(recommendations(&metrics), vec![Recommendation::Profitable]);
    }

    #[test]
    fn test_snapshot_restore() {
        let (mut tracker, start) = tracker();
        tracker.record_opportunity(start);
        tracker.record_trade(dec!(2), dec!(1.5), start);
        tracker.update_balance(dec!(10002));
        tracker.snapshot(start + Duration::hours(1));

        let snapshot = tracker.to_snapshot(start + Duration::hours(1));
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        let restored = PerformanceTracker::restore(dec!(10000), decoded);

        assert_eq!(restored.metrics(), tracker.metrics());
        assert_eq!(restored.started_at(), start);
        assert_eq!(restored.snapshots().count(), 1);
        assert_eq!(restored.balance_history().count(), 2);
    }
}
