//! Core types for decoded replay streams
//!
//! These mirror what the external `.aoe2record` parser hands us: a flat list
//! of operations, of which only actions and sync frames matter here.

use serde::{Deserialize, Serialize};

/// Milliseconds since the start of the game
pub type Timestamp = u64;

/// Player slot number (1-8, 0 is gaia)
pub type PlayerId = u8;

/// Raw action fields as decoded by the replay parser
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One replay operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Game clock advance
    Sync {
        /// Milliseconds since the previous sync
        elapsed: i64,
    },
    /// Player command
    Action {
        /// Action tag, e.g. `"RESEARCH"` or `"DE_QUEUE"`
        action: String,
        /// Action fields (`player_id`, `unit_id`, ...)
        #[serde(default)]
        data: Payload,
    },
    Chat,
    Viewlock,
    Start,
    Save,
    /// Any operation this crate has no use for
    #[serde(other)]
    Other,
}

/// A timestamped player action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayAction {
    pub timestamp: Timestamp,
    /// Action tag as found in the replay
    pub kind: String,
    #[serde(default)]
    pub payload: Payload,
}

impl ReplayAction {
    pub fn new(timestamp: Timestamp, kind: impl Into<String>, payload: Payload) -> Self {
        Self {
            timestamp,
            kind: kind.into(),
            payload,
        }
    }

    /// Add a payload field
    pub fn with(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(field.to_string(), value.into());
        self
    }

    /// Acting player, if the payload names a valid one
    pub fn player(&self) -> Option<PlayerId> {
        self.payload
            .get("player_id")
            .and_then(|v| v.as_u64())
            .and_then(|v| PlayerId::try_from(v).ok())
    }

    /// Payload rendered as compact JSON, for diagnostics
    pub fn raw_payload(&self) -> String {
        serde_json::Value::Object(self.payload.clone()).to_string()
    }
}

/// Format a replay timestamp as `h:mm:ss`
pub fn format_game_time(timestamp: Timestamp) -> String {
    let elapsed = chrono::Duration::milliseconds(timestamp.min(i64::MAX as u64) as i64);
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes() % 60;
    let seconds = elapsed.num_seconds() % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
