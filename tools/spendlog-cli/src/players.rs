//! Players command - list the players of replays

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use spendlog_core::{Config, ReplayDocument, Roster};

/// Arguments for the players command
#[derive(Args)]
pub struct PlayersArgs {
    /// Replay documents (JSON from the replay parser)
    #[arg(required = true)]
    pub replays: Vec<PathBuf>,

    /// Replace human player names with P<n>
    #[arg(long)]
    pub privacy: bool,
}

/// Execute the players command
pub fn execute(args: PlayersArgs, config: &Config) -> Result<()> {
    let privacy = args.privacy || config.analyser.privacy;

    for path in &args.replays {
        let document = ReplayDocument::from_file(path)
            .with_context(|| format!("Failed to load replay: {}", path.display()))?;
        let roster = Roster::from_players(&document.players, privacy)
            .with_context(|| format!("Failed to resolve players: {}", path.display()))?;

        println!("{}: {}", path.display(), roster.sorted_names().join(", "));
    }

    Ok(())
}
