//! Replay clock
//!
//! Actions carry no time of their own; the game clock is the running sum of
//! the sync frames that precede them.

use super::StreamError;
use super::types::{Operation, ReplayAction, Timestamp};

/// Running game clock over an operation list
#[derive(Debug, Default)]
pub struct Timeline {
    now: Timestamp,
    syncs: usize,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current game time
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Sync frames seen so far
    pub fn sync_count(&self) -> usize {
        self.syncs
    }

    /// Feed one operation; returns the stamped action if it was one
    pub fn advance(
        &mut self,
        index: usize,
        op: &Operation,
    ) -> Result<Option<ReplayAction>, StreamError> {
        match op {
            Operation::Sync { elapsed } => {
                let step = u64::try_from(*elapsed).map_err(|_| StreamError::MalformedStream {
                    index,
                    timestamp: self.now,
                    action: "SYNC".to_string(),
                    reason: format!("negative sync interval {}", elapsed),
                })?;
                self.now = self.now.checked_add(step).ok_or_else(|| StreamError::MalformedStream {
                    index,
                    timestamp: self.now,
                    action: "SYNC".to_string(),
                    reason: "game clock overflow".to_string(),
                })?;
                self.syncs += 1;
                Ok(None)
            }
            Operation::Action { action, data } => {
                Ok(Some(ReplayAction::new(self.now, action.clone(), data.clone())))
            }
            Operation::Chat
            | Operation::Viewlock
            | Operation::Start
            | Operation::Save
            | Operation::Other => Ok(None),
        }
    }

    /// Stamp every action of an operation list
    pub fn actions(operations: &[Operation]) -> Result<Vec<ReplayAction>, StreamError> {
        let mut timeline = Timeline::new();
        let mut actions = Vec::new();

        for (index, op) in operations.iter().enumerate() {
            if let Some(action) = timeline.advance(index, op)? {
                actions.push(action);
            }
        }

        tracing::debug!(
            "Timeline: {} actions over {} sync frames, {} ms",
            actions.len(),
            timeline.sync_count(),
            timeline.now()
        );
        Ok(actions)
    }
}
