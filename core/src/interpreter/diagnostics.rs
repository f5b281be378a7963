//! Interpreter diagnostics
//!
//! Everything the interpreter notices but recovers from ends up here, and is
//! forwarded to `tracing` at the matching level as it happens.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::replay::{PlayerId, Timestamp, format_game_time};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        })
    }
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Known action without resource effect
    IgnoredAction,
    /// A player's market fee dropped
    FeeReduced,
    /// Fee-reducing research seen again after the fee already dropped
    DuplicateFeeReduction,
    /// Costed action whose entity is missing from the catalog
    CatalogMiss,
    /// Known cost-relevant action without a cost model
    UnmodelledAction,
    /// Action tag never seen before
    UnclassifiedAction,
    /// Market action the market model refused, e.g. trading gold for gold
    RejectedTrade,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::IgnoredAction => Severity::Debug,
            DiagnosticKind::FeeReduced | DiagnosticKind::DuplicateFeeReduction => Severity::Info,
            DiagnosticKind::CatalogMiss
            | DiagnosticKind::UnmodelledAction
            | DiagnosticKind::RejectedTrade => Severity::Warning,
            DiagnosticKind::UnclassifiedAction => Severity::Critical,
        }
    }
}

/// One recovered condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub timestamp: Timestamp,
    /// Action tag as found in the replay
    pub action: String,
    pub player: Option<PlayerId>,
    pub message: String,
    /// Raw action payload, for conditions that need it to be understood
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Diagnostic {
    fn emit(&self) {
        let at = format_game_time(self.timestamp);
        let player = self.player.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
        match self.severity {
            Severity::Debug => {
                tracing::debug!("[{}] {} player {}: {}", at, self.action, player, self.message)
            }
            Severity::Info => {
                tracing::info!("[{}] {} player {}: {}", at, self.action, player, self.message)
            }
            Severity::Warning => {
                tracing::warn!("[{}] {} player {}: {}", at, self.action, player, self.message)
            }
            Severity::Critical => tracing::error!(
                "[{}] {} player {}: {} payload={}",
                at,
                self.action,
                player,
                self.message,
                self.payload.as_deref().unwrap_or("{}")
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8} {} {}",
            self.severity,
            format_game_time(self.timestamp),
            self.action
        )?;
        if let Some(player) = self.player {
            write!(f, " (player {})", player)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(payload) = &self.payload {
            write!(f, " {}", payload)?;
        }
        Ok(())
    }
}

/// Diagnostics of one run, in emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and forward it to the log
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostics at or above `severity`
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.severity >= severity)
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Number of diagnostics per severity
    pub fn counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.entries {
            *counts.entry(diagnostic.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct unclassified action tags, with occurrence counts
    pub fn unclassified_tags(&self) -> BTreeMap<String, usize> {
        let mut tags = BTreeMap::new();
        for diagnostic in self.of_kind(DiagnosticKind::UnclassifiedAction) {
            *tags.entry(diagnostic.action.clone()).or_insert(0) += 1;
        }
        tags
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
