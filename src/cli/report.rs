//! Handler for the `report` command.

use chrono::Utc;
use tabled::{Table, Tabled};

use crate::adapter::store::JsonFileStore;
use crate::app::Config;
use crate::cli::{output, ReportArgs};
use crate::domain::{LedgerSummary, Trade, TradeLedger, TradeStatus};
use crate::error::Result;
use crate::port::{LedgerStore, MetricsStore};
use crate::service::{PerformanceTracker, ProfitabilityReport};

#[derive(Tabled)]
struct TradeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pair")]
    pair: String,
    #[tabled(rename = "Opened")]
    opened: String,
    #[tabled(rename = "Entry Spread")]
    entry_spread: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Exit")]
    exit: String,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        let (profit, exit) = match trade.status() {
            TradeStatus::Open => ("-".to_string(), "open".to_string()),
            TradeStatus::Closed(close) => (
                format!("${}", close.actual_profit.round_dp(2)),
                close.reason.to_string(),
            ),
        };
        Self {
            id: trade.id().to_string(),
            pair: format!("{}/{}", trade.spot_symbol(), trade.perp_symbol()),
            opened: trade.opened_at().format("%Y-%m-%d %H:%M:%S").to_string(),
            entry_spread: output::pct(trade.entry_spread_pct()),
            size: format!("${}", trade.size().round_dp(2)),
            profit,
            exit,
        }
    }
}

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    ledger: Option<&'a LedgerSummary>,
    report: Option<&'a ProfitabilityReport>,
}

/// Print the persisted session state.
#[allow(clippy::result_large_err)]
pub fn execute(args: &ReportArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    let store = JsonFileStore::new(config.storage.data_dir.clone());

    let ledger = store
        .load_ledger()?
        .map(|snapshot| TradeLedger::from_snapshot(config.ledger_config(), snapshot));
    let initial_balance = ledger
        .as_ref()
        .map_or(config.trading.initial_balance, TradeLedger::initial_balance);
    let report = store
        .load_metrics()?
        .map(|snapshot| PerformanceTracker::restore(initial_balance, snapshot).report(Utc::now()));
    let summary = ledger.as_ref().map(TradeLedger::summary);

    if args.json {
        let json = serde_json::to_string_pretty(&JsonReport {
            ledger: summary.as_ref(),
            report: report.as_ref(),
        })?;
        println!("{json}");
        return Ok(());
    }

    output::header();
    match (&ledger, &summary) {
        (Some(ledger), Some(summary)) => {
            print_ledger(summary);
            let rows: Vec<TradeRow> = ledger.trades().map(TradeRow::from).collect();
            if !rows.is_empty() {
                output::section("Trades");
                output::table(&Table::new(rows).to_string());
            }
        }
        _ => output::warning(&format!(
            "No ledger snapshot in {}",
            store.data_dir().display()
        )),
    }

    match &report {
        Some(report) => print_report(report),
        None => output::warning("No metrics snapshot found"),
    }
    Ok(())
}

fn print_ledger(summary: &LedgerSummary) {
    output::section("Ledger");
    output::field("Initial balance", output::usd(summary.initial_balance));
    output::field("Current balance", output::usd(summary.current_balance));
    output::field(
        "Trades",
        format!(
            "{} ({} closed, {} open)",
            summary.total_trades, summary.closed_trades, summary.open_trades
        ),
    );
    output::field("Realized profit", output::usd(summary.total_profit));
    output::field("Win rate", output::pct(summary.win_rate));
    output::field("ROI", output::pct(summary.roi_pct));
    if let Some(best) = summary.best_trade {
        output::field("Best trade", output::usd(best));
    }
    if let Some(worst) = summary.worst_trade {
        output::field("Worst trade", output::usd(worst));
    }
}

/// Print a profitability report.
pub fn print_report(report: &ProfitabilityReport) {
    let m = &report.metrics;

    output::section("Profitability");
    if report.summary.is_profitable {
        output::success("Session is profitable");
    } else {
        output::warning("Session is not profitable");
    }
    output::field("Net profit", output::usd(report.summary.total_net_profit));
    output::field("ROI", output::pct(report.summary.roi_percentage));
    output::field("Runtime", format!("{}h", report.summary.runtime_hours.round_dp(2)));
    output::field("Profit / hour", output::usd(report.profit_per_hour));
    output::field("Projected monthly", output::usd(report.projected_monthly_profit));
    output::field("Break-even trades", report.break_even_trades);
    output::field("Risk-adjusted", report.risk_adjusted_return.round_dp(3));

    output::section("Trading");
    output::field("Opportunities", m.total_opportunities);
    output::field(
        "Trades",
        format!(
            "{} ({} won, {} lost)",
            m.total_trades, m.profitable_trades, m.losing_trades
        ),
    );
    output::field("Win rate", output::pct(m.win_rate));
    output::field("Fees paid", output::usd(m.total_fees_paid));
    output::field("Largest win", output::usd(m.largest_win));
    output::field("Largest loss", output::usd(m.largest_loss));
    output::field("Profit factor", m.profit_factor.round_dp(2));
    output::field("Max drawdown", output::pct(m.max_drawdown));
    output::field("Sharpe-like", m.sharpe_like_ratio.round_dp(3));

    if let Some(o) = &report.opportunities {
        output::section("Opportunities");
        output::field("Detected", o.total_opportunities);
        output::field("Average spread", output::pct(o.average_spread_pct));
        output::field("Potential profit", output::usd(o.potential_profits));
        if let Some(best) = &o.best_opportunity {
            output::field(
                "Best",
                format!(
                    "{}/{} at {} for {}",
                    best.spot_symbol(),
                    best.perp_symbol(),
                    output::pct(best.spread_pct()),
                    output::usd(best.expected_profit())
                ),
            );
        }
        for opp in &o.recent_opportunities {
            println!(
                "  {} {}/{} {}",
                opp.timestamp().format("%H:%M:%S"),
                opp.spot_symbol(),
                opp.perp_symbol(),
                output::pct(opp.spread_pct())
            );
        }
    }

    if let Some(risk) = &report.risk {
        output::section("Risk");
        output::field("Level", risk.level);
        output::field("Daily trades", risk.daily_trade_count);
        output::field("Daily P&L", output::usd(risk.daily_realized_pnl));
        output::field("Loss streak", risk.consecutive_losses);
        if let Some(until) = risk.cooldown_until {
            output::field("Cooldown until", until.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        for warning in &risk.warnings {
            output::warning(warning);
        }
    }

    if !report.recommendations.is_empty() {
        output::section("Recommendations");
        for rec in &report.recommendations {
            println!("  - {rec}");
        }
    }
}
