//! Spendlog CLI - expense ledgers from Age of Empires II replays
//!
//! # Commands
//!
//! - `spendlog convert` - Interpret a replay and write its ledger as TSV
//! - `spendlog summary` - Print per-player and per-team spending
//! - `spendlog players` - List the players of one or more replays
//! - `spendlog validate` - Check a replay document without a cost catalog
//!
//! # Usage
//!
//! Replays are read as the JSON document produced by the replay parser:
//! ```bash
//! # Write game.tsv next to game.json
//! spendlog convert game.json
//!
//! # Reuse game.tsv if it exists
//! spendlog summary game.json --use-cache
//! ```
//!
//! # Config (config.toml)
//!
//! ```toml
//! [analyser]
//! edition = "de"
//! data_dir = "halfon/data"
//!
//! [market]
//! version = "de"
//! default_fee = 0.30
//! reduced_fee = 0.15
//! ```

mod convert;
mod pipeline;
mod players;
mod summary;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spendlog_core::Config;

/// Spendlog CLI - expense ledgers from Age of Empires II replays
#[derive(Parser)]
#[command(name = "spendlog")]
#[command(about = "Expense ledgers from Age of Empires II replays")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: config.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpret a replay and write its expense ledger as TSV
    Convert(convert::ConvertArgs),

    /// Print per-player and per-team spending
    Summary(summary::SummaryArgs),

    /// List the players of one or more replays
    Players(players::PlayersArgs),

    /// Check a replay document without a cost catalog
    Validate(validate::ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Convert(args) => convert::execute(args, &config),
        Commands::Summary(args) => summary::execute(args, &config),
        Commands::Players(args) => players::execute(args, &config),
        Commands::Validate(args) => validate::execute(args),
    }
}
