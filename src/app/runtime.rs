//! Main application loop.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::adapter::notifier::WebhookNotifier;
use crate::app::config::Config;
use crate::app::monitor::{monitor_pair, Feeds};
use crate::app::orchestrator::{Orchestrator, Stores};
use crate::error::Result;
use crate::port::{LogNotifier, NotifierRegistry};
use crate::service::ProfitabilityReport;

/// How often daily resets and periodic snapshots are checked.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(30);

/// Ticks buffered per monitored pair before monitors wait on the orchestrator.
const TICKS_PER_PAIR: usize = 8;

/// Build the notifier registry from configuration.
#[must_use]
pub fn build_notifiers(config: &Config) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));

    match config.notifications.webhook() {
        Some(webhook) => {
            info!("Webhook notifications enabled");
            registry.register(Box::new(WebhookNotifier::new(webhook)));
        }
        None if config.notifications.enabled => {
            warn!("Notifications enabled but no webhook URL configured");
        }
        None => {}
    }

    registry
}

/// Main application struct.
pub struct App;

impl App {
    /// Run until `shutdown` resolves, then force-close and return the final report.
    #[allow(clippy::result_large_err)]
    pub async fn run<F>(
        config: Config,
        feeds: Feeds,
        stores: Stores,
        notifiers: NotifierRegistry,
        shutdown: F,
    ) -> Result<ProfitabilityReport>
    where
        F: Future<Output = ()>,
    {
        let mut orchestrator = Orchestrator::restore(&config, stores, notifiers, Utc::now())?;

        let pairs = config.symbol_pairs();
        let (tick_tx, mut tick_rx) = mpsc::channel(pairs.len().max(1) * TICKS_PER_PAIR);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handles: Vec<_> = pairs
            .into_iter()
            .map(|pair| {
                tokio::spawn(monitor_pair(
                    pair,
                    feeds.clone(),
                    config.feed.poll_interval(),
                    config.feed.retry.clone(),
                    tick_tx.clone(),
                    stop_rx.clone(),
                ))
            })
            .collect();
        drop(tick_tx);

        info!(
            pairs = handles.len(),
            balance = %orchestrator.ledger().current_balance(),
            "Monitoring started"
        );

        let mut housekeeping = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        housekeeping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                tick = tick_rx.recv() => {
                    let Some(tick) = tick else {
                        warn!("All monitors exited");
                        break;
                    };
                    orchestrator.on_tick(&tick, Utc::now());
                }
                _ = housekeeping.tick() => {
                    let now = Utc::now();
                    orchestrator.maybe_reset_daily(now);
                    orchestrator.maybe_snapshot(now);
                }
            }
        }

        let _ = stop_tx.send(true);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Monitor task failed");
            }
        }
        while let Ok(tick) = tick_rx.try_recv() {
            orchestrator.on_tick(&tick, Utc::now());
        }

        let report = orchestrator.shutdown(Utc::now());
        info!(
            trades = report.metrics.total_trades,
            net_profit = %report.summary.total_net_profit,
            opportunities = report.opportunities.as_ref().map_or(0, |o| o.total_opportunities),
            risk = %report.risk.as_ref().map_or_else(|| "-".to_string(), |r| r.level.to_string()),
            "Shutdown complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testkit::config::paper_config;
    use crate::testkit::feed::ScriptedFeed;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_run_trades_then_force_closes_on_shutdown() {
        let mut config = paper_config();
        config.trading.max_open_trades = 1;
        config.feed.poll_interval_ms = 5;

        let feeds = Feeds {
            spot: Arc::new(ScriptedFeed::new().with_price("SOLUSDT", dec!(100))),
            perp: Arc::new(ScriptedFeed::new().with_price("SOLPERP", dec!(100.5))),
        };

        let report = App::run(
            config,
            feeds,
            Stores::null(),
            NotifierRegistry::new(),
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        assert_eq!(report.metrics.total_trades, 1);
        assert_eq!(report.metrics.total_net_profit, dec!(-1.5));
        assert!(report.opportunities.is_some_and(|o| o.total_opportunities >= 1));
        assert!(report.risk.is_some());
    }

    #[tokio::test]
    async fn test_build_notifiers_without_webhook() {
        let registry = build_notifiers(&paper_config());
        assert_eq!(registry.len(), 1);
    }
}
