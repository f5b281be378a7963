//! Expense ledger
//!
//! The interpreter's output: one record per resource-relevant action, in
//! replay order. The column set and order of [`LEDGER_COLUMNS`] is the
//! contract every serialization of the ledger follows.

mod summary;
mod tsv;

pub use summary::{AgeUp, PlayerSummary, Summary, TeamSummary};
pub use tsv::{LedgerError, cached_tsv_path};

use serde::{Deserialize, Serialize};

use crate::economy::{MarketPrices, ResourceVector};
use crate::replay::{PlayerId, Timestamp};

/// Ledger columns, in order
pub const LEDGER_COLUMNS: [&str; 9] = [
    "ts", "type", "player", "id", "wood", "food", "gold", "stone", "name",
];

/// Price snapshot columns written after [`LEDGER_COLUMNS`]
pub const MARKET_COLUMNS: [&str; 3] = ["wood_market", "food_market", "stone_market"];

/// Action tags that put units in production
pub const QUEUE_ACTIONS: [&str; 2] = ["QUEUE", "DE_QUEUE"];

/// Market action tags
pub const MARKET_ACTIONS: [&str; 2] = ["BUY", "SELL"];

/// Action tag for building placement
pub const BUILD_ACTION: &str = "BUILD";

/// Action tag for research
pub const RESEARCH_ACTION: &str = "RESEARCH";

/// One resolved expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub timestamp: Timestamp,
    /// Action tag, e.g. `RESEARCH`
    pub action: String,
    pub player: PlayerId,
    /// Unit, building or technology id (0 for market trades)
    pub entity_id: u32,
    /// Resources spent (positive) or received (negative on the given-away
    /// side of a market trade)
    pub delta: ResourceVector,
    pub name: String,
    /// Market prices right after this action; not part of the column contract
    #[serde(skip)]
    pub prices: Option<MarketPrices>,
}

/// Append-only record sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseLedger {
    records: Vec<ExpenseRecord>,
}

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, record: ExpenseRecord) {
        debug_assert!(
            self.records
                .last()
                .is_none_or(|last| last.timestamp <= record.timestamp),
            "ledger records must be appended in timestamp order"
        );
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&ExpenseRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExpenseRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<ExpenseRecord> {
        self.records
    }

    /// Records of one player
    pub fn for_player(&self, player: PlayerId) -> impl Iterator<Item = &ExpenseRecord> {
        self.records.iter().filter(move |r| r.player == player)
    }

    /// Players with at least one record, ascending
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players: Vec<_> = self.records.iter().map(|r| r.player).collect();
        players.sort_unstable();
        players.dedup();
        players
    }

    /// Sum of a player's deltas
    pub fn totals_for(&self, player: PlayerId) -> ResourceVector {
        self.for_player(player)
            .fold(ResourceVector::zero(), |acc, r| acc + r.delta)
    }

    /// Running totals of a player's deltas, one point per record
    pub fn cumulative_for(&self, player: PlayerId) -> Vec<(Timestamp, ResourceVector)> {
        let mut running = ResourceVector::zero();
        self.for_player(player)
            .map(|r| {
                running += r.delta;
                (r.timestamp, running)
            })
            .collect()
    }
}

impl FromIterator<ExpenseRecord> for ExpenseLedger {
    fn from_iter<I: IntoIterator<Item = ExpenseRecord>>(iter: I) -> Self {
        let mut ledger = ExpenseLedger::new();
        for record in iter {
            ledger.push(record);
        }
        ledger
    }
}

impl<'a> IntoIterator for &'a ExpenseLedger {
    type Item = &'a ExpenseRecord;
    type IntoIter = std::slice::Iter<'a, ExpenseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
