//! Handler for the `run` command.

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use crate::adapter::store::JsonFileStore;
use crate::app::{build_notifiers, App, Config, Feeds, Stores};
use crate::cli::{report, RunArgs};
use crate::error::Result;

/// Execute the run command.
#[allow(clippy::result_large_err)]
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    // Apply CLI overrides
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(trade_size) = args.trade_size {
        config.trading.trade_size = trade_size;
    }
    if let Some(min_spread) = args.min_spread {
        config.trading.min_spread_pct = min_spread;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    config.validate()?;

    config.init_logging();
    info!(
        pairs = ?config.symbol_pairs().iter().map(ToString::to_string).collect::<Vec<_>>(),
        trade_size = %config.trading.trade_size,
        perp_source = ?config.feed.perp_source,
        "spreadhound starting"
    );

    let feeds = Feeds::from_config(&config)?;
    let stores = if args.no_persist {
        info!("Persistence disabled");
        Stores::null()
    } else {
        Stores::shared(Arc::new(JsonFileStore::new(config.storage.data_dir.clone())))
    };
    let notifiers = build_notifiers(&config);

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let report = App::run(config, feeds, stores, notifiers, shutdown).await?;
    report::print_report(&report);

    info!("spreadhound stopped");
    Ok(())
}
