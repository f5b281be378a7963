//! Decoded replay streams
//!
//! The binary `.aoe2record` format is decoded by an external parser. This
//! module takes its output from there:
//!
//! ```text
//! replay.json ─→ ReplayDocument ─→ Timeline ─→ [ReplayAction] ─→ Interpreter
//!                  players            sync clock     ts, kind, payload
//!                  operations
//! ```

mod document;
mod timeline;
mod types;

pub use document::{ReplayDocument, ReplayError};
pub use timeline::Timeline;
pub use types::{
    Operation, Payload, PlayerId, ReplayAction, Timestamp, format_game_time,
};

/// Structural errors in an action stream
///
/// These abort a whole run: nothing after the offending operation can be
/// trusted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error("malformed replay stream at #{index} ({action} at {timestamp} ms): {reason}")]
    MalformedStream {
        /// Position in the stream
        index: usize,
        timestamp: Timestamp,
        /// Action tag (or `SYNC`)
        action: String,
        reason: String,
    },
}
