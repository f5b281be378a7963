//! Game editions with their own data files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game edition, selecting which halfon data file to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameEdition {
    /// Definitive Edition
    #[default]
    De,
    /// HD Edition
    Hd,
    /// The Conquerors / WololoKingdoms
    Wk,
}

impl GameEdition {
    pub fn as_str(self) -> &'static str {
        match self {
            GameEdition::De => "de",
            GameEdition::Hd => "hd",
            GameEdition::Wk => "wk",
        }
    }

    /// halfon data file for this edition
    pub fn data_file_name(self) -> String {
        format!("units_buildings_techs.{}.json", self.as_str())
    }
}

impl fmt::Display for GameEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown edition name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game edition {0:?} (expected de, hd or wk)")]
pub struct ParseEditionError(pub String);

impl FromStr for GameEdition {
    type Err = ParseEditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(GameEdition::De),
            "hd" => Ok(GameEdition::Hd),
            "wk" => Ok(GameEdition::Wk),
            _ => Err(ParseEditionError(s.to_string())),
        }
    }
}
