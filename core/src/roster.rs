//! Player roster from the replay header

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::replay::PlayerId;

/// Team id the game uses for players without a team
pub const UNALIGNED_TEAM: u8 = 1;

/// Slot type from the replay header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    #[default]
    Human,
    Ai,
    Closed,
    #[serde(other)]
    Unknown,
}

/// One header player slot, as decoded by the replay parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub number: PlayerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ai_type: Option<String>,
    #[serde(default)]
    pub ai_name: Option<String>,
    #[serde(default)]
    pub kind: PlayerKind,
    #[serde(default)]
    pub civ_id: u32,
    #[serde(default)]
    pub color_id: u8,
    #[serde(default = "default_team")]
    pub resolved_team_id: u8,
}

fn default_team() -> u8 {
    UNALIGNED_TEAM
}

/// Resolved player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub number: PlayerId,
    pub name: String,
    pub civ_id: u32,
    pub color_id: u8,
    pub team: u8,
}

/// Roster errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// Slot is neither a named human, an AI, nor closed
    #[error("player {0} is neither a human, an AI, nor a closed slot")]
    UnresolvablePlayer(PlayerId),
}

/// Players taking part in a game
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    players: BTreeMap<PlayerId, RosterEntry>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Roster {
    /// Resolve header slots into a roster
    ///
    /// With `privacy`, human names are replaced by `P<number>`. AI names are
    /// kept since they identify no one.
    pub fn from_players(players: &[PlayerInfo], privacy: bool) -> Result<Self, RosterError> {
        let mut roster = BTreeMap::new();

        for player in players {
            let name = if let Some(name) = non_empty(&player.name) {
                if privacy {
                    format!("P{}", player.number)
                } else {
                    name.to_string()
                }
            } else if let Some(ai_name) = non_empty(&player.ai_name) {
                match non_empty(&player.ai_type) {
                    Some(ai_type) => format!("{} {}", ai_type, ai_name),
                    None => ai_name.to_string(),
                }
            } else if player.kind == PlayerKind::Closed {
                continue;
            } else {
                tracing::warn!("Unable to resolve player slot {:?}", player);
                return Err(RosterError::UnresolvablePlayer(player.number));
            };

            roster.insert(
                player.number,
                RosterEntry {
                    number: player.number,
                    name,
                    civ_id: player.civ_id,
                    color_id: player.color_id,
                    team: player.resolved_team_id,
                },
            );
        }

        Ok(Self { players: roster })
    }

    pub fn get(&self, player: PlayerId) -> Option<&RosterEntry> {
        self.players.get(&player)
    }

    /// Display name, `P<number>` for players missing from the header
    pub fn display_name(&self, player: PlayerId) -> String {
        self.players
            .get(&player)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("P{}", player))
    }

    /// Players in slot order
    pub fn iter(&self) -> impl Iterator<Item = &RosterEntry> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Player names, alphabetically
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.players.values().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    /// Slot numbers grouped by team
    pub fn teams(&self) -> BTreeMap<u8, Vec<PlayerId>> {
        let mut teams: BTreeMap<u8, Vec<PlayerId>> = BTreeMap::new();
        for player in self.players.values() {
            teams.entry(player.team).or_default().push(player.number);
        }
        teams
    }
}
