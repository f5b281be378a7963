//! Loading and interpreting replays, shared by the commands

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use spendlog_core::{
    Config, CostCatalog, Diagnostics, GameEdition, Interpretation, Interpreter, ReplayAction,
    ReplayDocument, Severity, Timeline,
};

/// Where the cost catalog comes from
#[derive(Args)]
pub struct CatalogArgs {
    /// halfon data file (default: <data_dir>/units_buildings_techs.<edition>.json)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Game edition whose data file is loaded (de, hd, wk)
    #[arg(long)]
    pub edition: Option<GameEdition>,
}

impl CatalogArgs {
    /// Catalog path after applying the command-line overrides
    pub fn catalog_path(&self, config: &Config) -> PathBuf {
        if let Some(data) = &self.data {
            return data.clone();
        }
        match self.edition {
            Some(edition) => config.analyser.data_dir.join(edition.data_file_name()),
            None => config.catalog_path(),
        }
    }
}

/// Load the cost catalog
pub fn load_catalog(config: &Config, args: &CatalogArgs) -> Result<CostCatalog> {
    let path = args.catalog_path(config);
    CostCatalog::from_file(&path)
        .with_context(|| format!("Failed to load cost catalog: {}", path.display()))
}

/// A replay document with its actions on the game clock
#[derive(Debug)]
pub struct LoadedReplay {
    pub document: ReplayDocument,
    pub actions: Vec<ReplayAction>,
}

/// Load a replay document and stamp its actions
pub fn load_replay(path: &Path) -> Result<LoadedReplay> {
    let document = ReplayDocument::from_file(path)
        .with_context(|| format!("Failed to load replay: {}", path.display()))?;
    let actions = Timeline::actions(&document.operations)
        .with_context(|| format!("Malformed replay: {}", path.display()))?;
    Ok(LoadedReplay { document, actions })
}

/// Interpret a replay's actions with the configured market rates
pub fn interpret(
    catalog: &CostCatalog,
    config: &Config,
    replay: &LoadedReplay,
) -> Result<Interpretation> {
    Interpreter::new(catalog, config.market.clone())
        .interpret(&replay.actions)
        .context("Replay interpretation aborted")
}

/// Print diagnostic counts, and every critical diagnostic
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    let counts = diagnostics.counts();
    if counts.is_empty() {
        println!("Diagnostics: none");
        return;
    }

    let parts: Vec<_> = counts
        .iter()
        .map(|(severity, count)| format!("{} {}", count, severity))
        .collect();
    println!("Diagnostics: {}", parts.join(", "));

    for diagnostic in diagnostics.at_least(Severity::Critical) {
        println!("  {}", diagnostic);
    }
}
