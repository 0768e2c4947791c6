//! Configuration and feed validation commands.

use std::path::Path;

use crate::app::{fetch_with_retry, Config, Feeds};
use crate::cli::output;
use crate::error::Result;

/// Validate configuration file without starting the monitor.
#[allow(clippy::result_large_err)]
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    output::header();
    output::section(&format!("Checking {}", path.display()));

    let config = Config::load(path)?;
    output::success("Configuration file is valid");

    output::section("Summary");
    for pair in &config.pairs {
        output::field("Pair", format!("{} / {}", pair.spot, pair.perp));
    }
    output::field("Perp source", format!("{:?}", config.feed.perp_source));
    output::field("Trade size", output::usd(config.trading.trade_size));
    output::field("Initial balance", output::usd(config.trading.initial_balance));
    output::field(
        "Entry threshold",
        output::pct(config.trading.min_spread_pct + config.fees.total_fee_pct),
    );
    output::field("Exit strategy", format!("{:?}", config.exit.exit_strategy));
    output::field("Max open trades", config.trading.max_open_trades);
    output::field("Data dir", config.storage.data_dir.display());

    if config.notifications.webhook().is_some() {
        output::success("Webhook notifications enabled");
    } else if config.notifications.enabled {
        output::warning("Notifications enabled but no webhook URL (set WEBHOOK_URL)");
    } else {
        output::field("Notifications", "disabled");
    }

    Ok(())
}

/// Fetch one price for each leg of every configured pair.
#[allow(clippy::result_large_err)]
pub async fn execute_feed<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path)?;
    let feeds = Feeds::from_config(&config)?;
    output::header();
    output::section("Price feeds");

    let mut failures = 0;
    for pair in config.symbol_pairs() {
        let spot = fetch_with_retry(feeds.spot.as_ref(), &pair.spot, &config.feed.retry).await;
        let perp = fetch_with_retry(feeds.perp.as_ref(), &pair.perp, &config.feed.retry).await;
        match (spot, perp) {
            (Some(spot), Some(perp)) => {
                let spread = crate::domain::spread_pct(spot.price, perp.price)
                    .map_or_else(|| "n/a".to_string(), output::pct);
                output::success(&format!(
                    "{pair}: spot {} perp {} spread {spread}",
                    spot.price, perp.price
                ));
            }
            _ => {
                failures += 1;
                output::error(&format!("{pair}: price unavailable"));
            }
        }
    }

    if failures > 0 {
        return Err(crate::error::Error::FeedUnavailable {
            symbol: format!("{failures} pair(s)"),
            reason: "no price after retries".into(),
        });
    }
    Ok(())
}
