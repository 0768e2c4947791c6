//! Command-line interface definitions.

pub mod check;
pub mod output;
pub mod report;
pub mod run;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Spreadhound - spot/perp basis arbitrage detection with paper trading.
#[derive(Parser, Debug)]
#[command(name = "spreadhound")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor configured pairs and paper trade until Ctrl-C
    Run(RunArgs),

    /// Print the persisted ledger and profitability report
    Report(ReportArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `spreadhound check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
    /// Fetch one price per configured pair
    Feed(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Override trade size in USD
    #[arg(long)]
    pub trade_size: Option<Decimal>,

    /// Override minimum spread threshold (percent)
    #[arg(long)]
    pub min_spread: Option<Decimal>,

    /// Override snapshot directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Keep all state in memory and write no snapshots
    #[arg(long)]
    pub no_persist: bool,
}

/// Arguments for the `report` subcommand.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
