//! Convert command - interpret a replay and write its ledger
//!
//! The ledger lands next to the replay as `<stem>.tsv` unless an output path
//! is given. Recovered problems are summarized; only fatal ones fail the
//! command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use spendlog_core::Config;
use spendlog_core::ledger::cached_tsv_path;

use crate::pipeline::{self, CatalogArgs};

/// Arguments for the convert command
#[derive(Args)]
pub struct ConvertArgs {
    /// Replay document (JSON from the replay parser)
    pub replay: PathBuf,

    /// Output TSV file (default: replay path with a .tsv extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub catalog: CatalogArgs,
}

/// Execute the convert command
pub fn execute(args: ConvertArgs, config: &Config) -> Result<()> {
    println!("Converting {}...", args.replay.display());

    let catalog = pipeline::load_catalog(config, &args.catalog)?;
    println!("  Catalog: {} entries", catalog.len());

    let replay = pipeline::load_replay(&args.replay)?;
    println!("  Actions: {}", replay.actions.len());

    let result = pipeline::interpret(&catalog, config, &replay)?;

    let output = args
        .output
        .unwrap_or_else(|| cached_tsv_path(&args.replay));
    result
        .ledger
        .save_tsv(&output)
        .with_context(|| format!("Failed to write ledger: {}", output.display()))?;

    println!();
    println!("=== Complete ===");
    println!("Records: {}", result.ledger.len());
    println!("Market rates: {}", config.market.version);
    pipeline::print_diagnostics(&result.diagnostics);
    println!("Output: {}", output.display());

    Ok(())
}
