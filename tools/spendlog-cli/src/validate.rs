//! Validate a replay document without a cost catalog

use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use spendlog_core::interpreter::{ActionKind, Command, classify};
use spendlog_core::replay::format_game_time;

use crate::pipeline;

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Replay document (JSON from the replay parser)
    pub replay: PathBuf,
}

/// Validate a replay document
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("Validating replay: {}", args.replay.display());

    let replay = pipeline::load_replay(&args.replay)?;

    println!();
    println!("=== Replay Loaded ===");
    println!("Players: {}", replay.document.players.len());
    println!("Operations: {}", replay.document.operations.len());
    println!("Actions: {}", replay.actions.len());
    if let Some(last) = replay.actions.last() {
        println!("Last action: {}", format_game_time(last.timestamp));
    }

    let mut costed = 0;
    let mut uncosted = 0;
    let mut unclassified: BTreeMap<String, usize> = BTreeMap::new();
    let mut errors = Vec::new();

    for action in &replay.actions {
        let kind = classify(&action.kind);
        match &kind {
            ActionKind::Unclassified(tag) => {
                *unclassified.entry(tag.clone()).or_default() += 1;
            }
            kind if kind.is_costed() => {
                costed += 1;
                if let Err(reason) = Command::decode(kind, &action.payload) {
                    errors.push(format!(
                        "{} {}: {}",
                        format_game_time(action.timestamp),
                        action.kind,
                        reason
                    ));
                }
            }
            _ => uncosted += 1,
        }
    }

    println!();
    println!("Costed actions: {}", costed);
    println!("Uncosted actions: {}", uncosted);

    if !unclassified.is_empty() {
        println!();
        println!("=== Unclassified Actions ===");
        for (tag, count) in &unclassified {
            println!("  {} x{}", tag, count);
        }
    }

    if errors.is_empty() {
        println!();
        println!("All costed actions decode correctly.");
    } else {
        println!();
        println!("=== Decode Errors ===");
        for error in &errors {
            println!("  {}", error);
        }
        anyhow::bail!("{} decode error(s)", errors.len());
    }

    Ok(())
}
