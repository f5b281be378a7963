//! Replay document loading
//!
//! A replay document is the JSON dump of an `.aoe2record` produced by the
//! replay parser: the player roster from the header followed by every
//! operation in recording order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::types::Operation;
use crate::roster::PlayerInfo;

/// Decoded replay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayDocument {
    /// Header player slots
    #[serde(default)]
    pub players: Vec<PlayerInfo>,
    /// Body operations, in recording order
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Document loading errors
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read replay {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid replay document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReplayDocument {
    /// Parse a replay document from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a replay document from a file
    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Number of action operations
    pub fn action_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Action { .. }))
            .count()
    }
}
