//! Summary command - per-player and per-team spending

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use spendlog_core::ledger::{PlayerSummary, cached_tsv_path};
use spendlog_core::replay::format_game_time;
use spendlog_core::{Config, ExpenseLedger, Roster, Summary};

use crate::pipeline::{self, CatalogArgs};

/// Arguments for the summary command
#[derive(Args)]
pub struct SummaryArgs {
    /// Replay document (JSON from the replay parser)
    pub replay: PathBuf,

    /// Reuse the ledger next to the replay instead of interpreting again
    #[arg(long)]
    pub use_cache: bool,

    /// Replace human player names with P<n>
    #[arg(long)]
    pub privacy: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub catalog: CatalogArgs,
}

/// Execute the summary command
pub fn execute(args: SummaryArgs, config: &Config) -> Result<()> {
    let replay = pipeline::load_replay(&args.replay)?;
    let privacy = args.privacy || config.analyser.privacy;
    let roster = Roster::from_players(&replay.document.players, privacy)
        .with_context(|| format!("Failed to resolve players: {}", args.replay.display()))?;

    let cache = cached_tsv_path(&args.replay);
    let ledger = if args.use_cache && cache.exists() {
        tracing::info!("Using cached ledger {}", cache.display());
        ExpenseLedger::load_tsv(&cache)
            .with_context(|| format!("Failed to read cached ledger: {}", cache.display()))?
    } else {
        let catalog = pipeline::load_catalog(config, &args.catalog)?;
        let result = pipeline::interpret(&catalog, config, &replay)?;
        if args.use_cache {
            result
                .ledger
                .save_tsv(&cache)
                .with_context(|| format!("Failed to write ledger: {}", cache.display()))?;
        }
        result.ledger
    };

    let summary = Summary::from_ledger(&ledger, &roster, &config.market);

    if args.json {
        println!("{}", summary.to_json().context("Failed to serialize summary")?);
        return Ok(());
    }

    println!("=== {} ===", args.replay.display());
    println!(
        "Generated: {}",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Market rates: {}", summary.market_version);
    println!("Last record: {}", format_game_time(summary.last_record));

    for player in &summary.players {
        println!();
        print_player(player);
    }

    if !summary.teams.is_empty() {
        println!();
        println!("=== Teams ===");
        for team in &summary.teams {
            let names: Vec<_> = team
                .players
                .iter()
                .map(|&p| roster.display_name(p))
                .collect();
            println!(
                "Team {} ({}): {}  unified {:.0}",
                team.team,
                names.join(", "),
                team.spent,
                team.unified
            );
        }
    }

    Ok(())
}

fn print_player(player: &PlayerSummary) {
    println!("{} (P{}, team {})", player.name, player.player, player.team);
    println!("  Spent:   {}", player.spent);
    if player.market_actions > 0 {
        println!("  Market:  {} ({} trades)", player.traded, player.market_actions);
    }
    println!("  Unified: {:.0} gold", player.unified);
    println!(
        "  Actions: {} queued, {} built, {} researched",
        player.queue_actions, player.buildings_placed, player.researches
    );
    for age in &player.ages {
        println!("  {}: {}", age.name, age.time);
    }
}
