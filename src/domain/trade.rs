//! Paper trade records and exit decisions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{Symbol, TradeId};
use super::money::{Pct, Price, Usd};
use super::opportunity::Opportunity;

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Spread converged to the configured target.
    TargetReached,
    /// Unrealized loss exceeded the stop.
    StopLoss,
    /// Profitable and the spread narrowed past the take-profit fraction.
    TakeProfit,
    /// Held longer than the maximum holding time.
    MaxHoldTime,
    /// Force-closed while the process was stopping.
    Shutdown,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TargetReached => "target reached",
            Self::StopLoss => "stop loss",
            Self::TakeProfit => "take profit",
            Self::MaxHoldTime => "max hold time",
            Self::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// Outcome of evaluating exit rules for one open trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitDecision {
    /// Keep the trade open.
    Hold { unrealized_pnl: Usd },
    /// Close the trade.
    Exit { reason: ExitReason, unrealized_pnl: Usd },
}

impl ExitDecision {
    #[must_use]
    pub const fn should_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }

    #[must_use]
    pub const fn reason(&self) -> Option<ExitReason> {
        match self {
            Self::Exit { reason, .. } => Some(*reason),
            Self::Hold { .. } => None,
        }
    }

    #[must_use]
    pub const fn unrealized_pnl(&self) -> Usd {
        match self {
            Self::Hold { unrealized_pnl } | Self::Exit { unrealized_pnl, .. } => *unrealized_pnl,
        }
    }
}

/// Close-side fields, present only once a trade is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeClose {
    pub close_spot_price: Price,
    pub close_perp_price: Price,
    pub actual_profit: Usd,
    pub closed_at: DateTime<Utc>,
    pub reason: ExitReason,
}

/// Lifecycle state of a trade. `Closed` is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Open,
    Closed(TradeClose),
}

impl TradeStatus {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

/// A simulated long-spot / short-perp position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    id: TradeId,
    status: TradeStatus,
    spot_symbol: Symbol,
    perp_symbol: Symbol,
    entry_spot_price: Price,
    entry_perp_price: Price,
    entry_spread_pct: Pct,
    size: Usd,
    expected_profit: Usd,
    opened_at: DateTime<Utc>,
}

impl Trade {
    /// Open a new trade from an opportunity.
    #[must_use]
    pub fn open(id: TradeId, opportunity: &Opportunity, opened_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: TradeStatus::Open,
            spot_symbol: opportunity.spot_symbol().clone(),
            perp_symbol: opportunity.perp_symbol().clone(),
            entry_spot_price: opportunity.spot_price(),
            entry_perp_price: opportunity.perp_price(),
            entry_spread_pct: opportunity.spread_pct(),
            size: opportunity.trade_size(),
            expected_profit: opportunity.expected_profit(),
            opened_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> TradeId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> &TradeStatus {
        &self.status
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    #[must_use]
    pub fn spot_symbol(&self) -> &Symbol {
        &self.spot_symbol
    }

    #[must_use]
    pub fn perp_symbol(&self) -> &Symbol {
        &self.perp_symbol
    }

    #[must_use]
    pub fn entry_spot_price(&self) -> Price {
        self.entry_spot_price
    }

    #[must_use]
    pub fn entry_perp_price(&self) -> Price {
        self.entry_perp_price
    }

    #[must_use]
    pub fn entry_spread_pct(&self) -> Pct {
        self.entry_spread_pct
    }

    #[must_use]
    pub fn size(&self) -> Usd {
        self.size
    }

    #[must_use]
    pub fn expected_profit(&self) -> Usd {
        self.expected_profit
    }

    #[must_use]
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Close-side details if closed.
    #[must_use]
    pub fn close_info(&self) -> Option<&TradeClose> {
        match &self.status {
            TradeStatus::Closed(close) => Some(close),
            TradeStatus::Open => None,
        }
    }

    /// Realized profit if closed.
    #[must_use]
    pub fn actual_profit(&self) -> Option<Usd> {
        self.close_info().map(|c| c.actual_profit)
    }

    /// Transition to `Closed`. Callers must check the trade is open.
    pub(crate) fn mark_closed(&mut self, close: TradeClose) {
        debug_assert!(self.is_open(), "closing an already closed trade");
        self.status = TradeStatus::Closed(close);
    }
}
