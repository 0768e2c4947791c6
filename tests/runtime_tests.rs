mod support;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tempfile::TempDir;
use tokio::sync::oneshot;

use spreadhound::adapter::store::JsonFileStore;
use spreadhound::app::{App, Feeds};
use spreadhound::port::{LedgerStore, MetricsStore, NotifierRegistry};
use spreadhound::testkit::feed::ScriptedFeed;

use support::{shared, single_slot_config};

#[tokio::test]
async fn run_trades_on_live_ticks_and_persists() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()));

    let mut config = single_slot_config();
    config.feed.poll_interval_ms = 5;

    let spot = Arc::new(ScriptedFeed::new().with_price("SOLUSDT", dec!(100)));
    let perp = Arc::new(ScriptedFeed::new().with_price("SOLPERP", dec!(100.5)));
    let feeds = Feeds {
        spot: spot.clone(),
        perp: perp.clone(),
    };

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let driver = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        perp.set_price("SOLPERP", dec!(100.1));
        tokio::time::sleep(Duration::from_millis(60)).await;
        let _ = stop_tx.send(());
    });

    let report = App::run(config, feeds, shared(&store), NotifierRegistry::new(), async {
        let _ = stop_rx.await;
    })
    .await
    .unwrap();
    driver.await.unwrap();

    assert_eq!(report.metrics.total_trades, 1);
    assert_eq!(report.metrics.total_net_profit, dec!(2.5));
    assert!(spot.calls() > 2);

    let ledger = store.load_ledger().unwrap().unwrap();
    assert_eq!(ledger.balance, dec!(10002.5));
    let metrics = store.load_metrics().unwrap().unwrap();
    assert_eq!(metrics.metrics.total_trades, 1);
}

#[tokio::test]
async fn run_survives_feed_outage() {
    let mut config = single_slot_config();
    config.feed.poll_interval_ms = 5;
    config.feed.retry.initial_delay_ms = 1;
    config.feed.retry.max_delay_ms = 1;

    let spot = Arc::new(
        ScriptedFeed::new()
            .with_price("SOLUSDT", dec!(100))
            .fail_next("SOLUSDT", 10),
    );
    let feeds = Feeds {
        spot: spot.clone(),
        perp: Arc::new(ScriptedFeed::new().with_price("SOLPERP", dec!(100.5))),
    };

    let report = App::run(
        config,
        feeds,
        spreadhound::app::Stores::null(),
        NotifierRegistry::new(),
        tokio::time::sleep(Duration::from_millis(150)),
    )
    .await
    .unwrap();

    assert!(spot.calls() > 10);
    assert_eq!(report.metrics.total_trades, 1);
}
