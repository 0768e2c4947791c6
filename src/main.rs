use clap::Parser;
use spreadhound::cli::{check, output, report, run, CheckCommand, Cli, Commands};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Report(args) => report::execute(args),
        Commands::Check(CheckCommand::Config(args)) => check::execute_config(&args.config),
        Commands::Check(CheckCommand::Feed(args)) => check::execute_feed(&args.config).await,
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
