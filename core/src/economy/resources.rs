//! Resource kinds and resource vectors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Neg};

/// A stockpile resource.
///
/// The replay encodes market resources as small integers where stone comes
/// before gold: 0 = wood, 1 = food, 2 = stone, 3 = gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Food,
    Stone,
    Gold,
}

impl Resource {
    /// Ledger column order (wood, food, gold, stone)
    pub const LEDGER_ORDER: [Resource; 4] = [
        Resource::Wood,
        Resource::Food,
        Resource::Gold,
        Resource::Stone,
    ];

    /// Map a replay resource id to a resource
    pub fn from_replay_id(id: u64) -> Option<Self> {
        match id {
            0 => Some(Resource::Wood),
            1 => Some(Resource::Food),
            2 => Some(Resource::Stone),
            3 => Some(Resource::Gold),
            _ => None,
        }
    }

    /// Replay resource id of this resource
    pub fn replay_id(self) -> u8 {
        match self {
            Resource::Wood => 0,
            Resource::Food => 1,
            Resource::Stone => 2,
            Resource::Gold => 3,
        }
    }

    /// Lowercase name, as used in ledger columns and display names
    pub fn name(self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Food => "food",
            Resource::Stone => "stone",
            Resource::Gold => "gold",
        }
    }

    /// Whether the market trades this resource against gold
    pub fn is_commodity(self) -> bool {
        !matches!(self, Resource::Gold)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Amounts of each resource.
///
/// Costs are non-negative. Market records are signed: the resource given
/// away is negative and the resource received is positive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceVector {
    #[serde(default)]
    pub wood: f64,
    #[serde(default)]
    pub food: f64,
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub stone: f64,
}

impl ResourceVector {
    /// Create a vector from its four components
    pub fn new(wood: f64, food: f64, gold: f64, stone: f64) -> Self {
        Self {
            wood,
            food,
            gold,
            stone,
        }
    }

    /// The zero vector
    pub fn zero() -> Self {
        Self::default()
    }

    /// A vector with a single non-zero component
    pub fn single(resource: Resource, amount: f64) -> Self {
        let mut vector = Self::zero();
        vector[resource] = amount;
        vector
    }

    /// Multiply every component by `factor`
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            wood: self.wood * factor,
            food: self.food * factor,
            gold: self.gold * factor,
            stone: self.stone * factor,
        }
    }

    /// Sum of all components
    pub fn total(&self) -> f64 {
        self.wood + self.food + self.gold + self.stone
    }

    pub fn is_zero(&self) -> bool {
        Resource::LEDGER_ORDER.iter().all(|&r| self[r] == 0.0)
    }

    pub fn is_non_negative(&self) -> bool {
        Resource::LEDGER_ORDER.iter().all(|&r| self[r] >= 0.0)
    }

    /// First negative component, if any
    pub fn first_negative(&self) -> Option<Resource> {
        Resource::LEDGER_ORDER
            .iter()
            .copied()
            .find(|&r| self[r] < 0.0)
    }
}

impl Index<Resource> for ResourceVector {
    type Output = f64;

    fn index(&self, resource: Resource) -> &f64 {
        match resource {
            Resource::Wood => &self.wood,
            Resource::Food => &self.food,
            Resource::Gold => &self.gold,
            Resource::Stone => &self.stone,
        }
    }
}

impl IndexMut<Resource> for ResourceVector {
    fn index_mut(&mut self, resource: Resource) -> &mut f64 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Food => &mut self.food,
            Resource::Gold => &mut self.gold,
            Resource::Stone => &mut self.stone,
        }
    }
}

impl Add for ResourceVector {
    type Output = ResourceVector;

    fn add(self, rhs: ResourceVector) -> ResourceVector {
        ResourceVector {
            wood: self.wood + rhs.wood,
            food: self.food + rhs.food,
            gold: self.gold + rhs.gold,
            stone: self.stone + rhs.stone,
        }
    }
}

impl AddAssign for ResourceVector {
    fn add_assign(&mut self, rhs: ResourceVector) {
        *self = *self + rhs;
    }
}

impl Neg for ResourceVector {
    type Output = ResourceVector;

    fn neg(self) -> ResourceVector {
        self.scaled(-1.0)
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[wood {}, food {}, gold {}, stone {}]",
            self.wood, self.food, self.gold, self.stone
        )
    }
}
