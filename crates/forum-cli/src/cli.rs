//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use forum_migrate::DEFAULT_TARGET;

/// Forum backend - schema migrations and snowflake IDs
#[derive(Parser, Debug)]
#[command(name = "forum")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override config file path (default: forum.yml or forum.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory holding the migrations base. Only consulted when the units
    /// compiled into the binary have nothing under that base
    #[arg(short = 'm', long, global = true, env = "FORUM_MIGRATIONS_DIR")]
    pub migrations_dir: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a migration target to the configured database
    Vape(VapeArgs),

    /// List the units a migration target depends on
    Units(UnitsArgs),

    /// Generate and convert snowflake IDs
    Id(IdArgs),
}

/// Arguments for the vape command
#[derive(Args, Debug)]
pub struct VapeArgs {
    /// Target unit to migrate to
    #[arg(short = 't', long, default_value = DEFAULT_TARGET)]
    pub migtarget: String,

    /// Print the rounds that would run without applying them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the units command
#[derive(Args, Debug)]
pub struct UnitsArgs {
    /// Target unit whose dependency closure is listed
    #[arg(short = 't', long, default_value = DEFAULT_TARGET)]
    pub migtarget: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: UnitsOutput,
}

/// Unit list output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the id command
#[derive(Args, Debug)]
pub struct IdArgs {
    #[command(subcommand)]
    pub command: IdCommands,
}

/// Snowflake ID operations
#[derive(Subcommand, Debug)]
pub enum IdCommands {
    /// Generate new IDs with the configured instance
    New {
        /// Number of IDs to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Encode a numeric ID as base58
    Encode {
        /// Numeric ID
        id: i64,
    },

    /// Decode a base58 ID back to its number
    Decode {
        /// Base58 text
        value: String,
    },
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
