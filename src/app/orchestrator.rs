//! Per-tick trading pipeline.
//!
//! The orchestrator exclusively owns the detector, ledger, risk governor and
//! tracker. Every method is synchronous, so a tick's read-check-mutate sequence
//! never yields to another task.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::app::config::Config;
use crate::domain::{
    ClosedTrade, ExitReason, Opportunity, OpportunityDetector, Price, PriceTick, Symbol,
    TradeId, TradeLedger, Usd,
};
use crate::error::{PersistenceError, Result};
use crate::port::{
    CooldownEvent, Event, LedgerStore, MetricsStore, NotifierRegistry, NullStore,
    OpportunityEvent, RejectionEvent, TradeClosedEvent, TradeOpenedEvent,
};
use crate::service::{PerformanceTracker, ProfitabilityReport, RiskGovernor};

/// Snapshot stores used by the orchestrator.
#[derive(Clone)]
pub struct Stores {
    pub ledger: Arc<dyn LedgerStore>,
    pub metrics: Arc<dyn MetricsStore>,
}

impl Stores {
    /// Use one backend for both snapshots.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: LedgerStore + MetricsStore + 'static,
    {
        Self {
            ledger: store.clone(),
            metrics: store,
        }
    }

    /// Persist nothing.
    #[must_use]
    pub fn null() -> Self {
        Self::shared(Arc::new(NullStore))
    }
}

/// Second gate applied to detected opportunities before trading them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityFilter {
    pub min_profit: Usd,
    pub min_spread_pct: Decimal,
    pub spread_margin_pct: Decimal,
}

impl QualityFilter {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_profit: config.trading.min_profit_threshold,
            min_spread_pct: config.trading.min_spread_pct,
            spread_margin_pct: config.trading.quality_spread_margin_pct,
        }
    }

    #[must_use]
    pub fn accepts(&self, opportunity: &Opportunity) -> bool {
        opportunity.expected_profit() >= self.min_profit
            && opportunity.spread_pct() > self.min_spread_pct + self.spread_margin_pct
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub closed: Vec<TradeId>,
    pub opportunity: Option<Opportunity>,
    pub opened: Option<TradeId>,
}

/// Owns the trading state and drives it tick by tick.
pub struct Orchestrator {
    detector: OpportunityDetector,
    ledger: TradeLedger,
    risk: RiskGovernor,
    tracker: PerformanceTracker,
    quality: QualityFilter,
    stores: Stores,
    notifiers: NotifierRegistry,
    snapshot_interval: chrono::Duration,
    last_prices: HashMap<Symbol, Price>,
    last_snapshot: DateTime<Utc>,
    current_day: NaiveDate,
    degraded: bool,
}

impl Orchestrator {
    /// Build from config, restoring persisted ledger and metrics if present.
    ///
    /// An unreadable snapshot starts that part fresh in degraded mode. Only a
    /// snapshot from a newer schema is an error.
    #[allow(clippy::result_large_err)]
    pub fn restore(
        config: &Config,
        stores: Stores,
        notifiers: NotifierRegistry,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut degraded = false;

        let ledger = match or_fresh(stores.ledger.load_ledger(), "ledger", &mut degraded)? {
            Some(snapshot) => {
                let ledger = TradeLedger::from_snapshot(config.ledger_config(), snapshot);
                info!(
                    balance = %ledger.current_balance(),
                    open_trades = ledger.open_count(),
                    "Restored ledger"
                );
                ledger
            }
            None => TradeLedger::new(config.ledger_config()),
        };

        let tracker = match or_fresh(stores.metrics.load_metrics(), "metrics", &mut degraded)? {
            Some(snapshot) => {
                info!(started_at = %snapshot.started_at, "Restored performance metrics");
                PerformanceTracker::restore(ledger.initial_balance(), snapshot)
            }
            None => {
                let mut tracker = PerformanceTracker::new(ledger.initial_balance(), now);
                if ledger.equity() != ledger.initial_balance() {
                    tracker.update_balance(ledger.equity());
                }
                tracker
            }
        };

        let mut orchestrator = Self::new(config, ledger, tracker, stores, notifiers, now);
        orchestrator.degraded = degraded;
        Ok(orchestrator)
    }

    #[must_use]
    pub fn new(
        config: &Config,
        ledger: TradeLedger,
        tracker: PerformanceTracker,
        stores: Stores,
        notifiers: NotifierRegistry,
        now: DateTime<Utc>,
    ) -> Self {
        let snapshot_interval = config.performance.snapshot_interval();
        Self {
            detector: OpportunityDetector::new(config.detector_config()),
            ledger,
            risk: RiskGovernor::new(config.risk_limits()),
            tracker,
            quality: QualityFilter::from_config(config),
            stores,
            notifiers,
            snapshot_interval,
            last_prices: HashMap::new(),
            last_snapshot: now,
            current_day: now.date_naive(),
            degraded: false,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    #[must_use]
    pub fn risk(&self) -> &RiskGovernor {
        &self.risk
    }

    #[must_use]
    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    #[must_use]
    pub fn detector(&self) -> &OpportunityDetector {
        &self.detector
    }

    /// Whether the last save failed and state is only held in memory.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    #[must_use]
    pub fn last_price(&self, symbol: &Symbol) -> Option<Price> {
        self.last_prices.get(symbol).copied()
    }

    /// Process one price observation for a pair.
    pub fn on_tick(&mut self, tick: &PriceTick, now: DateTime<Utc>) -> TickOutcome {
        let spot = tick.spot.price;
        let perp = tick.perp.price;
        self.last_prices.insert(tick.pair.spot.clone(), spot);
        self.last_prices.insert(tick.pair.perp.clone(), perp);

        let mut outcome = TickOutcome::default();

        for (id, decision) in self.ledger.exits_for(&tick.pair, spot, perp, now) {
            if let Some(reason) = decision.reason() {
                if self.close_trade(id, spot, perp, reason, now) {
                    outcome.closed.push(id);
                }
            }
        }

        if !self.ledger.has_capacity() {
            debug!(pair = %tick.pair, "At open trade capacity, skipping detection");
            return outcome;
        }

        let detected = self
            .detector
            .check(&tick.pair.spot, &tick.pair.perp, spot, perp, now);
        let Some(opportunity) = detected else {
            return outcome;
        };

        self.tracker.record_opportunity(now);
        self.notifiers
            .notify_all(Event::OpportunityDetected(OpportunityEvent::from(&opportunity)));

        if self.quality.accepts(&opportunity) {
            outcome.opened = self.open_trade(&opportunity, now);
        } else {
            debug!(
                spread_pct = %opportunity.spread_pct(),
                profit = %opportunity.expected_profit(),
                "Opportunity below quality bar"
            );
        }
        outcome.opportunity = Some(opportunity);
        outcome
    }

    fn open_trade(&mut self, opportunity: &Opportunity, now: DateTime<Utc>) -> Option<TradeId> {
        match self.ledger.open(opportunity, &self.risk, now) {
            Ok(trade) => {
                self.notifiers.notify_all(Event::TradeOpened(TradeOpenedEvent::new(
                    &trade,
                    self.ledger.current_balance(),
                )));
                self.persist_ledger(now);
                Some(trade.id())
            }
            Err(e) => {
                info!(pair = %opportunity.spot_symbol(), reason = %e, "Trade rejected");
                self.notifiers.notify_all(Event::TradeRejected(RejectionEvent {
                    spot_symbol: opportunity.spot_symbol().clone(),
                    perp_symbol: opportunity.perp_symbol().clone(),
                    reason: e.to_string(),
                }));
                None
            }
        }
    }

    fn close_trade(
        &mut self,
        id: TradeId,
        spot: Price,
        perp: Price,
        reason: ExitReason,
        now: DateTime<Utc>,
    ) -> bool {
        match self.ledger.close(id, spot, perp, reason, now) {
            Ok(closed) => {
                self.record_close(&closed, now);
                self.persist_ledger(now);
                self.persist_metrics(now);
                true
            }
            Err(e) => {
                warn!(trade_id = %id, error = %e, "Close failed");
                false
            }
        }
    }

    fn record_close(&mut self, closed: &ClosedTrade, now: DateTime<Utc>) {
        if let Some(until) = self
            .risk
            .record_trade_result(closed.profit, closed.trade.size(), now)
        {
            self.notifiers.notify_all(Event::CooldownStarted(CooldownEvent {
                consecutive_losses: self.risk.state().consecutive_losses,
                until,
            }));
        }
        self.tracker.record_trade(closed.profit, closed.fees, now);
        self.tracker.update_balance(self.ledger.equity());
        self.notifiers.notify_all(Event::TradeClosed(TradeClosedEvent::new(
            closed,
            self.ledger.current_balance(),
        )));
    }

    /// Take a periodic snapshot if the interval elapsed. Returns whether one was taken.
    pub fn maybe_snapshot(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.last_snapshot < self.snapshot_interval {
            return false;
        }
        self.last_snapshot = now;
        self.tracker.snapshot(now);
        self.persist_metrics(now);

        let report = self.report(now);
        self.notifiers
            .notify_all(Event::ProfitabilityReport(Box::new(report)));
        true
    }

    /// Reset daily risk counters on a UTC date change. Returns whether it reset.
    pub fn maybe_reset_daily(&mut self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if today == self.current_day {
            return false;
        }
        self.current_day = today;
        self.risk.reset_daily();
        true
    }

    /// Force-close everything, persist, and produce the final report.
    pub fn shutdown(&mut self, now: DateTime<Utc>) -> ProfitabilityReport {
        let closed = self.ledger.force_close_all(&self.last_prices, now);
        for trade in &closed {
            self.record_close(trade, now);
        }

        self.tracker.snapshot(now);
        self.persist_ledger(now);
        self.persist_metrics(now);

        let report = self.report(now);
        self.notifiers
            .notify_all(Event::ProfitabilityReport(Box::new(report.clone())));
        report
    }

    /// Profitability report with the opportunity history and risk status attached.
    pub fn report(&mut self, now: DateTime<Utc>) -> ProfitabilityReport {
        let mut report = self.tracker.report(now);
        report.opportunities = Some(self.detector.summary());
        report.risk = Some(self.risk.status(now));
        report
    }

    fn persist_ledger(&mut self, now: DateTime<Utc>) {
        let result = self.stores.ledger.save_ledger(&self.ledger.snapshot(now));
        self.note_persistence(result.map_err(|e| e.to_string()), "ledger");
    }

    fn persist_metrics(&mut self, now: DateTime<Utc>) {
        let result = self.stores.metrics.save_metrics(&self.tracker.to_snapshot(now));
        self.note_persistence(result.map_err(|e| e.to_string()), "metrics");
    }

    fn note_persistence(&mut self, result: std::result::Result<(), String>, what: &str) {
        match result {
            Ok(()) if self.degraded => {
                self.degraded = false;
                info!(snapshot = what, "Persistence recovered, state reconciled");
            }
            Ok(()) => {}
            Err(e) => {
                if !self.degraded {
                    warn!(snapshot = what, error = %e, "Persistence failed, continuing in memory");
                }
                self.degraded = true;
            }
        }
    }
}

#[allow(clippy::result_large_err)]
fn or_fresh<T>(
    loaded: std::result::Result<Option<T>, PersistenceError>,
    what: &str,
    degraded: &mut bool,
) -> Result<Option<T>> {
    match loaded {
        Ok(snapshot) => Ok(snapshot),
        Err(e @ PersistenceError::UnsupportedVersion { .. }) => Err(e.into()),
        Err(e) => {
            warn!(snapshot = what, error = %e, "Snapshot unreadable, starting fresh");
            *degraded = true;
            Ok(None)
        }
    }
}
