//! Notifier port for event notifications.
//!
//! Events describe what happened on the trading path. Delivery is
//! fire-and-forget: a notifier must never block the orchestrator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{ClosedTrade, ExitReason, Opportunity, Symbol, Trade, TradeId};
use crate::service::ProfitabilityReport;

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// Spread opportunity detected.
    OpportunityDetected(OpportunityEvent),
    /// Paper trade opened.
    TradeOpened(TradeOpenedEvent),
    /// Paper trade closed.
    TradeClosed(TradeClosedEvent),
    /// The ledger refused an open request.
    TradeRejected(RejectionEvent),
    /// Consecutive losses triggered a cooldown.
    CooldownStarted(CooldownEvent),
    /// Periodic profitability report.
    ProfitabilityReport(Box<ProfitabilityReport>),
}

/// Opportunity detection event.
#[derive(Debug, Clone)]
pub struct OpportunityEvent {
    pub spot_symbol: Symbol,
    pub perp_symbol: Symbol,
    pub spot_price: Decimal,
    pub perp_price: Decimal,
    pub spread_pct: Decimal,
    pub expected_profit: Decimal,
}

impl From<&Opportunity> for OpportunityEvent {
    fn from(opp: &Opportunity) -> Self {
        Self {
            spot_symbol: opp.spot_symbol().clone(),
            perp_symbol: opp.perp_symbol().clone(),
            spot_price: opp.spot_price(),
            perp_price: opp.perp_price(),
            spread_pct: opp.spread_pct(),
            expected_profit: opp.expected_profit(),
        }
    }
}

/// Trade opened event.
#[derive(Debug, Clone)]
pub struct TradeOpenedEvent {
    pub trade_id: TradeId,
    pub spot_symbol: Symbol,
    pub perp_symbol: Symbol,
    pub entry_spread_pct: Decimal,
    pub size: Decimal,
    pub expected_profit: Decimal,
    pub balance: Decimal,
}

impl TradeOpenedEvent {
    #[must_use]
    pub fn new(trade: &Trade, balance: Decimal) -> Self {
        Self {
            trade_id: trade.id(),
            spot_symbol: trade.spot_symbol().clone(),
            perp_symbol: trade.perp_symbol().clone(),
            entry_spread_pct: trade.entry_spread_pct(),
            size: trade.size(),
            expected_profit: trade.expected_profit(),
            balance,
        }
    }
}

/// Trade closed event.
#[derive(Debug, Clone)]
pub struct TradeClosedEvent {
    pub trade_id: TradeId,
    pub spot_symbol: Symbol,
    pub perp_symbol: Symbol,
    pub reason: ExitReason,
    pub entry_spread_pct: Decimal,
    pub profit: Decimal,
    pub fees: Decimal,
    pub held_secs: i64,
    pub balance: Decimal,
}

impl TradeClosedEvent {
    #[must_use]
    pub fn new(closed: &ClosedTrade, balance: Decimal) -> Self {
        let trade = &closed.trade;
        let (reason, held_secs) = trade.close_info().map_or((ExitReason::Shutdown, 0), |c| {
            (c.reason, (c.closed_at - trade.opened_at()).num_seconds())
        });
        Self {
            trade_id: trade.id(),
            spot_symbol: trade.spot_symbol().clone(),
            perp_symbol: trade.perp_symbol().clone(),
            reason,
            entry_spread_pct: trade.entry_spread_pct(),
            profit: closed.profit,
            fees: closed.fees,
            held_secs,
            balance,
        }
    }
}

/// Rejected open request.
#[derive(Debug, Clone)]
pub struct RejectionEvent {
    pub spot_symbol: Symbol,
    pub perp_symbol: Symbol,
    pub reason: String,
}

/// Cooldown started.
#[derive(Debug, Clone)]
pub struct CooldownEvent {
    pub consecutive_losses: u32,
    pub until: DateTime<Utc>,
}

/// Trait for notification handlers.
///
/// Implementations must be thread-safe and return quickly. Slow delivery
/// (HTTP, etc.) belongs on a background task.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Fans events out to every registered notifier.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::OpportunityDetected(e) => {
                info!(
                    spot = %e.spot_symbol,
                    perp = %e.perp_symbol,
                    spread_pct = %e.spread_pct.round_dp(4),
                    profit = %e.expected_profit.round_dp(2),
                    "Opportunity detected"
                );
            }
            Event::TradeOpened(e) => {
                info!(
                    trade_id = %e.trade_id,
                    spot = %e.spot_symbol,
                    entry_spread_pct = %e.entry_spread_pct.round_dp(4),
                    size = %e.size,
                    balance = %e.balance.round_dp(2),
                    "Trade opened"
                );
            }
            Event::TradeClosed(e) => {
                info!(
                    trade_id = %e.trade_id,
                    spot = %e.spot_symbol,
                    reason = %e.reason,
                    profit = %e.profit.round_dp(2),
                    held_secs = e.held_secs,
                    balance = %e.balance.round_dp(2),
                    "Trade closed"
                );
            }
            Event::TradeRejected(e) => {
                info!(spot = %e.spot_symbol, reason = %e.reason, "Trade rejected");
            }
            Event::CooldownStarted(e) => {
                info!(
                    consecutive_losses = e.consecutive_losses,
                    until = %e.until,
                    "Cooldown started"
                );
            }
            Event::ProfitabilityReport(r) => {
                info!(
                    net_profit = %r.summary.total_net_profit,
                    roi_pct = %r.summary.roi_percentage,
                    runtime_hours = %r.summary.runtime_hours,
                    trades = r.metrics.total_trades,
                    "Profitability report"
                );
            }
        }
    }
}
