//! Typed commands decoded from action payloads

use serde_json::Value;

use super::classify::ActionKind;
use crate::economy::{Resource, TradeSide};
use crate::replay::{Payload, PlayerId};

/// A costed action with its payload decoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Building placement
    Build { player: PlayerId, building: u32 },
    /// Unit production (`QUEUE` or `DE_QUEUE`), `amount` units at once
    Queue {
        player: PlayerId,
        unit: u32,
        amount: u32,
    },
    Research { player: PlayerId, technology: u32 },
    /// Market click, `lots` lots of one commodity
    Trade {
        player: PlayerId,
        side: TradeSide,
        resource: Resource,
        lots: u32,
    },
}

impl Command {
    pub fn player(&self) -> PlayerId {
        match self {
            Command::Build { player, .. }
            | Command::Queue { player, .. }
            | Command::Research { player, .. }
            | Command::Trade { player, .. } => *player,
        }
    }

    /// Decode the payload of a costed action
    ///
    /// The error is a human-readable reason; the caller adds the stream
    /// position.
    pub fn decode(kind: &ActionKind, payload: &Payload) -> Result<Self, String> {
        let fields = Fields(payload);

        let command = match kind {
            ActionKind::Build => Command::Build {
                player: fields.player()?,
                building: fields.id("building_id")?,
            },
            ActionKind::Queue | ActionKind::DeQueue => Command::Queue {
                player: fields.player()?,
                unit: fields.id("unit_id")?,
                amount: fields.optional_count("amount")?.unwrap_or(1),
            },
            ActionKind::Research => Command::Research {
                player: fields.player()?,
                technology: fields.id("technology_id")?,
            },
            ActionKind::Buy | ActionKind::Sell => {
                let side = if *kind == ActionKind::Buy {
                    TradeSide::Buy
                } else {
                    TradeSide::Sell
                };
                let resource_id = fields.unsigned("resource_id")?;
                let resource = Resource::from_replay_id(resource_id)
                    .ok_or_else(|| format!("unknown resource_id {}", resource_id))?;
                Command::Trade {
                    player: fields.player()?,
                    side,
                    resource,
                    lots: fields.count("amount")?,
                }
            }
            ActionKind::Unmodelled(_) | ActionKind::Ignored(_) | ActionKind::Unclassified(_) => {
                return Err(format!("{} has no cost model", kind));
            }
        };

        Ok(command)
    }
}

/// Field accessors over a raw payload
struct Fields<'a>(&'a Payload);

impl Fields<'_> {
    fn get(&self, field: &str) -> Result<&Value, String> {
        self.0
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| format!("missing field `{}`", field))
    }

    fn unsigned(&self, field: &str) -> Result<u64, String> {
        let value = self.get(field)?;
        value
            .as_u64()
            .ok_or_else(|| format!("field `{}` is not an unsigned integer: {}", field, value))
    }

    fn narrow<T: TryFrom<u64>>(&self, field: &str) -> Result<T, String> {
        let raw = self.unsigned(field)?;
        T::try_from(raw).map_err(|_| format!("field `{}` out of range: {}", field, raw))
    }

    fn player(&self) -> Result<PlayerId, String> {
        self.narrow("player_id")
    }

    fn id(&self, field: &str) -> Result<u32, String> {
        self.narrow(field)
    }

    fn count(&self, field: &str) -> Result<u32, String> {
        self.narrow(field)
    }

    fn optional_count(&self, field: &str) -> Result<Option<u32>, String> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.count(field).map(Some),
        }
    }
}
