//! Paper trade ledger: trade arena, cash balance and lifecycle transitions.
//!
//! The ledger is the sole owner of [`Trade`] records. Other components refer to
//! trades by [`TradeId`] only. All mutations are synchronous so a full
//! read-check-mutate sequence never spans an await point.
//!
//! Balance invariant maintained by every operation:
//!
//! ```text
//! current_balance + Σ open sizes = initial_balance + Σ closed net profit
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ids::{Symbol, TradeId};
use super::money::{pct_to_rate, spread_pct, Pct, Price, Usd};
use super::opportunity::Opportunity;
use super::quote::SymbolPair;
use super::trade::{ExitDecision, ExitReason, Trade, TradeClose};
use crate::error::{LedgerError, RiskError};

/// Current ledger snapshot schema version.
pub const LEDGER_SCHEMA_VERSION: u32 = 1;

/// Exit policy selecting whether the spread-target rule applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStrategy {
    /// Exit once the spread converges to the target, plus the risk rules.
    #[default]
    SpreadTarget,
    /// Only stop loss, take profit and max hold time.
    RulesOnly,
}

/// Exit rule parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRules {
    pub strategy: ExitStrategy,
    pub target_spread_pct: Pct,
    pub stop_loss_usd: Usd,
    pub take_profit_fraction: Decimal,
    pub max_hold: Duration,
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    pub initial_balance: Usd,
    pub max_open_trades: usize,
    /// Combined round-trip fee in percent; the same constant prices entries and exits.
    pub total_fee_pct: Pct,
    pub exit: ExitRules,
}

impl LedgerConfig {
    /// Round-trip fee as a fraction of trade size.
    #[must_use]
    pub fn round_trip_fee_rate(&self) -> Decimal {
        pct_to_rate(self.total_fee_pct)
    }
}

/// Pre-open gate consulted after capacity and balance checks.
pub trait TradeGate {
    /// Approve or reject a trade of `size` given the current open exposure.
    fn check_trade_allowed(
        &self,
        size: Usd,
        open_exposure: Usd,
        now: DateTime<Utc>,
    ) -> Result<(), RiskError>;
}

/// Gate that approves everything.
pub struct OpenGate;

impl TradeGate for OpenGate {
    fn check_trade_allowed(&self, _: Usd, _: Usd, _: DateTime<Utc>) -> Result<(), RiskError> {
        Ok(())
    }
}

/// Result of a successful close.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub trade: Trade,
    /// Net profit after fees.
    pub profit: Usd,
    /// Round-trip fees charged.
    pub fees: Usd,
}

/// Persisted form of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub schema_version: u32,
    pub initial_balance: Usd,
    pub balance: Usd,
    pub next_trade_id: u64,
    pub trades: Vec<Trade>,
    pub last_updated: DateTime<Utc>,
}

/// Closed-trade performance overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub total_profit: Usd,
    pub win_rate: Pct,
    pub roi_pct: Pct,
    pub current_balance: Usd,
    pub initial_balance: Usd,
    pub best_trade: Option<Usd>,
    pub worst_trade: Option<Usd>,
}

/// Trade state machine and cash balance.
#[derive(Debug)]
pub struct TradeLedger {
    config: LedgerConfig,
    trades: BTreeMap<TradeId, Trade>,
    current_balance: Usd,
    next_id: u64,
}

impl TradeLedger {
    /// Create an empty ledger funded with the configured initial balance.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            current_balance: config.initial_balance,
            config,
            trades: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a ledger from a persisted snapshot. The snapshot is authoritative
    /// for balances, trades and id allocation.
    #[must_use]
    pub fn from_snapshot(mut config: LedgerConfig, snapshot: LedgerSnapshot) -> Self {
        config.initial_balance = snapshot.initial_balance;
        let trades: BTreeMap<_, _> = snapshot.trades.into_iter().map(|t| (t.id(), t)).collect();
        let highest = trades.keys().next_back().map_or(0, TradeId::value);
        let ledger = Self {
            config,
            trades,
            current_balance: snapshot.balance,
            next_id: snapshot.next_trade_id.max(highest + 1),
        };
        if ledger.open_count() > ledger.config.max_open_trades {
            warn!(
                open = ledger.open_count(),
                max = ledger.config.max_open_trades,
                "Restored ledger holds more open trades than allowed; new opens blocked until some close"
            );
        }
        ledger
    }

    /// Serialize state for persistence.
    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> LedgerSnapshot {
        LedgerSnapshot {
            schema_version: LEDGER_SCHEMA_VERSION,
            initial_balance: self.config.initial_balance,
            balance: self.current_balance,
            next_trade_id: self.next_id,
            trades: self.trades.values().cloned().collect(),
            last_updated: now,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn current_balance(&self) -> Usd {
        self.current_balance
    }

    #[must_use]
    pub fn initial_balance(&self) -> Usd {
        self.config.initial_balance
    }

    /// Open trades in id order.
    pub fn open_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values().filter(|t| t.is_open())
    }

    /// All trades in id order.
    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values()
    }

    #[must_use]
    pub fn get(&self, id: TradeId) -> Option<&Trade> {
        self.trades.get(&id)
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open_trades().count()
    }

    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.open_count() < self.config.max_open_trades
    }

    /// Capital currently committed to open trades.
    #[must_use]
    pub fn open_exposure(&self) -> Usd {
        self.open_trades().map(Trade::size).sum()
    }

    /// Cash plus committed capital: initial balance plus realized profit.
    #[must_use]
    pub fn equity(&self) -> Usd {
        self.current_balance + self.open_exposure()
    }

    /// Sum of net profit over closed trades.
    #[must_use]
    pub fn realized_profit(&self) -> Usd {
        self.trades.values().filter_map(Trade::actual_profit).sum()
    }

    /// Open a trade for `opportunity`.
    ///
    /// Checks, in order: capacity, balance, then the risk gate.
    pub fn open(
        &mut self,
        opportunity: &Opportunity,
        gate: &dyn TradeGate,
        now: DateTime<Utc>,
    ) -> Result<Trade, LedgerError> {
        let open = self.open_count();
        if open >= self.config.max_open_trades {
            return Err(LedgerError::CapacityExceeded {
                open,
                max: self.config.max_open_trades,
            });
        }

        let size = opportunity.trade_size();
        if self.current_balance < size {
            return Err(LedgerError::InsufficientBalance {
                required: size,
                available: self.current_balance,
            });
        }

        gate.check_trade_allowed(size, self.open_exposure(), now)
            .map_err(LedgerError::RiskBlocked)?;

        let id = TradeId::new(self.next_id);
        self.next_id += 1;
        self.current_balance -= size;

        let trade = Trade::open(id, opportunity, now);
        self.trades.insert(id, trade.clone());

        info!(
            trade_id = %id,
            pair = %format!("{}/{}", trade.spot_symbol(), trade.perp_symbol()),
            size = %size,
            spread_pct = %trade.entry_spread_pct(),
            expected_profit = %trade.expected_profit(),
            balance = %self.current_balance,
            "Paper trade opened"
        );

        Ok(trade)
    }

    /// Mark-to-market P&L of a trade at the given prices, net of the round-trip fee.
    #[must_use]
    pub fn unrealized_pnl(&self, trade: &Trade, spot: Price, perp: Price) -> Usd {
        let current = spread_pct(spot, perp).unwrap_or(trade.entry_spread_pct());
        self.pnl_at_spread(trade, current)
    }

    fn pnl_at_spread(&self, trade: &Trade, current_spread_pct: Pct) -> Usd {
        pct_to_rate(trade.entry_spread_pct() - current_spread_pct) * trade.size()
            - self.fees_for(trade)
    }

    fn fees_for(&self, trade: &Trade) -> Usd {
        trade.size() * self.config.round_trip_fee_rate()
    }

    /// Evaluate every exit rule for one trade. The reported reason is the first
    /// triggered rule among target, stop loss, take profit, max hold.
    #[must_use]
    pub fn evaluate_exit(
        &self,
        trade: &Trade,
        spot: Price,
        perp: Price,
        now: DateTime<Utc>,
    ) -> ExitDecision {
        let rules = &self.config.exit;
        let Some(current) = spread_pct(spot, perp) else {
            return ExitDecision::Hold {
                unrealized_pnl: Decimal::ZERO,
            };
        };
        let unrealized_pnl = self.pnl_at_spread(trade, current);

        let target = rules.strategy == ExitStrategy::SpreadTarget && current <= rules.target_spread_pct;
        let stop = unrealized_pnl < -rules.stop_loss_usd;
        let take = unrealized_pnl > Decimal::ZERO
            && current < trade.entry_spread_pct() * rules.take_profit_fraction;
        let expired = now - trade.opened_at() > rules.max_hold;

        let reason = [
            (target, ExitReason::TargetReached),
            (stop, ExitReason::StopLoss),
            (take, ExitReason::TakeProfit),
            (expired, ExitReason::MaxHoldTime),
        ]
        .into_iter()
        .find_map(|(hit, reason)| hit.then_some(reason));

        match reason {
            Some(reason) => ExitDecision::Exit {
                reason,
                unrealized_pnl,
            },
            None => ExitDecision::Hold { unrealized_pnl },
        }
    }

    /// Exit decisions for the open trades on `pair`, in id order.
    ///
    /// Both legs must match: two pairs may share a spot symbol.
    #[must_use]
    pub fn exits_for(
        &self,
        pair: &SymbolPair,
        spot: Price,
        perp: Price,
        now: DateTime<Utc>,
    ) -> Vec<(TradeId, ExitDecision)> {
        self.open_trades()
            .filter(|t| t.spot_symbol() == &pair.spot && t.perp_symbol() == &pair.perp)
            .map(|t| (t.id(), self.evaluate_exit(t, spot, perp, now)))
            .collect()
    }

    /// Close an open trade at the given fill prices.
    ///
    /// Unknown ids and already closed trades yield `TradeNotFound` and leave
    /// the balance untouched.
    pub fn close(
        &mut self,
        id: TradeId,
        spot: Price,
        perp: Price,
        reason: ExitReason,
        now: DateTime<Utc>,
    ) -> Result<ClosedTrade, LedgerError> {
        let fee_rate = self.config.round_trip_fee_rate();
        let trade = self
            .trades
            .get_mut(&id)
            .filter(|t| t.is_open())
            .ok_or(LedgerError::TradeNotFound(id))?;

        let current = spread_pct(spot, perp).unwrap_or(trade.entry_spread_pct());
        let fees = trade.size() * fee_rate;
        let profit = pct_to_rate(trade.entry_spread_pct() - current) * trade.size() - fees;

        trade.mark_closed(TradeClose {
            close_spot_price: spot,
            close_perp_price: perp,
            actual_profit: profit,
            closed_at: now,
            reason,
        });
        let trade = trade.clone();
        self.current_balance += trade.size() + profit;

        info!(
            trade_id = %id,
            reason = %reason,
            profit = %profit,
            expected = %trade.expected_profit(),
            balance = %self.current_balance,
            "Paper trade closed"
        );

        Ok(ClosedTrade {
            trade,
            profit,
            fees,
        })
    }

    /// Close every open trade with the last observed prices, falling back to
    /// the trade's own entry price for a leg that was never observed.
    pub fn force_close_all(
        &mut self,
        last_prices: &HashMap<Symbol, Price>,
        now: DateTime<Utc>,
    ) -> Vec<ClosedTrade> {
        let fills: Vec<(TradeId, Price, Price)> = self
            .open_trades()
            .map(|t| {
                let spot = last_prices
                    .get(t.spot_symbol())
                    .copied()
                    .unwrap_or(t.entry_spot_price());
                let perp = last_prices
                    .get(t.perp_symbol())
                    .copied()
                    .unwrap_or(t.entry_perp_price());
                (t.id(), spot, perp)
            })
            .collect();

        if !fills.is_empty() {
            info!(count = fills.len(), "Force-closing remaining open trades");
        }

        fills
            .into_iter()
            .filter_map(|(id, spot, perp)| {
                match self.close(id, spot, perp, ExitReason::Shutdown, now) {
                    Ok(closed) => Some(closed),
                    Err(e) => {
                        debug!(trade_id = %id, error = %e, "Skipping force close");
                        None
                    }
                }
            })
            .collect()
    }

    /// Aggregate statistics over the ledger's trades.
    #[must_use]
    pub fn summary(&self) -> LedgerSummary {
        let profits: Vec<Usd> = self.trades.values().filter_map(Trade::actual_profit).collect();
        let closed = profits.len();
        let wins = profits.iter().filter(|p| **p > Decimal::ZERO).count();
        let initial = self.config.initial_balance;

        LedgerSummary {
            total_trades: self.trades.len(),
            closed_trades: closed,
            open_trades: self.open_count(),
            total_profit: profits.iter().copied().sum(),
            win_rate: ratio_pct(Decimal::from(wins), Decimal::from(closed)),
            roi_pct: ratio_pct(self.current_balance - initial, initial),
            current_balance: self.current_balance,
            initial_balance: initial,
            best_trade: profits.iter().copied().max(),
            worst_trade: profits.iter().copied().min(),
        }
    }
}

fn ratio_pct(numerator: Decimal, denominator: Decimal) -> Pct {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator * Decimal::ONE_HUNDRED
    }
}
