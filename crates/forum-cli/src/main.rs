//! Forum backend CLI - schema migrations and snowflake IDs

use anyhow::Result;
use clap::Parser;

mod assets;
mod cli;
mod commands;

use cli::Cli;
use commands::{id, units, vape};

/// Install the global logger: `info` by default, `debug` with `--verbose`.
/// `RUST_LOG` takes precedence over both.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match &cli.command {
        cli::Commands::Vape(args) => vape::execute(args, &cli.global).await,
        cli::Commands::Units(args) => units::execute(args, &cli.global).await,
        cli::Commands::Id(args) => id::execute(args, &cli.global).await,
    }
}
