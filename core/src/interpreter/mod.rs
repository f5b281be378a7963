//! Replay expense interpreter
//!
//! Folds a timestamped action stream into an [`ExpenseLedger`]. Each action
//! is classified, its payload decoded, and its cost resolved against the
//! [`CostCatalog`] or, for market clicks, against the run's [`MarketState`].
//!
//! ```text
//! ReplayAction ─→ classify ─→ Command::decode ─→ catalog / market ─→ ExpenseRecord
//!                    │                                   │
//!                    └──── Diagnostics ←─────────────────┘
//! ```
//!
//! Structural problems (timestamps going backwards, payloads missing required
//! fields) abort the run with [`StreamError::MalformedStream`]. Everything
//! else is recovered from and reported as a [`Diagnostic`].

mod classify;
mod command;
mod diagnostics;

#[cfg(test)]
mod tests;

pub use classify::{ActionKind, IGNORED_ACTIONS, UnmodelledAction, classify};
pub use command::Command;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};

use crate::catalog::{CostCatalog, CostEntry, EntityId};
use crate::economy::{FeeChange, MarketRates, MarketState, ResourceVector};
use crate::ledger::{ExpenseLedger, ExpenseRecord};
use crate::replay::{PlayerId, ReplayAction, StreamError, Timestamp};

/// Result of interpreting one replay
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub ledger: ExpenseLedger,
    pub diagnostics: Diagnostics,
    /// Market as it stood after the last action
    pub market: MarketState,
    /// Actions consumed
    pub actions: usize,
}

/// Streaming interpreter for one replay
///
/// Borrows the catalog and owns the market state of the run. Create a new
/// interpreter for every replay.
pub struct Interpreter<'a> {
    catalog: &'a CostCatalog,
    market: MarketState,
    ledger: ExpenseLedger,
    diagnostics: Diagnostics,
    /// Actions consumed so far
    processed: usize,
    last_timestamp: Option<Timestamp>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with a fresh market built from `rates`
    pub fn new(catalog: &'a CostCatalog, rates: MarketRates) -> Self {
        Self {
            catalog,
            market: MarketState::new(rates),
            ledger: ExpenseLedger::new(),
            diagnostics: Diagnostics::new(),
            processed: 0,
            last_timestamp: None,
        }
    }

    /// Interpret a whole action stream
    pub fn interpret(mut self, actions: &[ReplayAction]) -> Result<Interpretation, StreamError> {
        for action in actions {
            self.step(action)?;
        }
        Ok(self.finish())
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn ledger(&self) -> &ExpenseLedger {
        &self.ledger
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Actions consumed so far
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Consume the interpreter and hand over its results
    pub fn finish(self) -> Interpretation {
        tracing::info!(
            "Interpreted {} actions: {} records, {} diagnostics",
            self.processed,
            self.ledger.len(),
            self.diagnostics.len()
        );
        Interpretation {
            ledger: self.ledger,
            diagnostics: self.diagnostics,
            market: self.market,
            actions: self.processed,
        }
    }

    /// Process one action
    ///
    /// Returns the record it produced, if any.
    pub fn step(&mut self, action: &ReplayAction) -> Result<Option<&ExpenseRecord>, StreamError> {
        if let Some(last) = self.last_timestamp {
            if action.timestamp < last {
                return Err(self.malformed(
                    action,
                    format!(
                        "timestamp {} ms is before previous action at {} ms",
                        action.timestamp, last
                    ),
                ));
            }
        }

        let kind = classify(&action.kind);
        let emitted = match &kind {
            ActionKind::Build
            | ActionKind::Queue
            | ActionKind::DeQueue
            | ActionKind::Research
            | ActionKind::Buy
            | ActionKind::Sell => {
                let command = Command::decode(&kind, &action.payload)
                    .map_err(|reason| self.malformed(action, reason))?;
                if let Command::Trade { lots, .. } = command {
                    let max = self.market.rates().max_lots;
                    if lots > max {
                        return Err(self.malformed(
                            action,
                            format!("{} lots in one trade exceeds the limit of {}", lots, max),
                        ));
                    }
                }
                self.execute(action, &kind, command)
            }
            ActionKind::Unmodelled(what) => {
                self.report(
                    action,
                    DiagnosticKind::UnmodelledAction,
                    format!("{} has a resource effect that is not modelled", what.tag()),
                    Some(action.raw_payload()),
                );
                false
            }
            ActionKind::Ignored(_) => {
                self.report(
                    action,
                    DiagnosticKind::IgnoredAction,
                    "no resource effect".to_string(),
                    None,
                );
                false
            }
            ActionKind::Unclassified(tag) => {
                self.report(
                    action,
                    DiagnosticKind::UnclassifiedAction,
                    format!("unknown action type {:?}", tag),
                    Some(action.raw_payload()),
                );
                false
            }
        };

        self.last_timestamp = Some(action.timestamp);
        self.processed += 1;

        Ok(if emitted { self.ledger.last() } else { None })
    }

    fn malformed(&self, action: &ReplayAction, reason: String) -> StreamError {
        StreamError::MalformedStream {
            index: self.processed,
            timestamp: action.timestamp,
            action: action.kind.clone(),
            reason,
        }
    }

    fn report(
        &mut self,
        action: &ReplayAction,
        kind: DiagnosticKind,
        message: String,
        payload: Option<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            kind,
            severity: kind.severity(),
            timestamp: action.timestamp,
            action: action.kind.clone(),
            player: action.player(),
            message,
            payload,
        });
    }

    /// Resolve a costed command; returns whether a record was emitted
    fn execute(&mut self, action: &ReplayAction, kind: &ActionKind, command: Command) -> bool {
        match command {
            Command::Build { player, building } => {
                match self.resolve(action, EntityId::UnitOrBuilding(building)) {
                    Some(entry) => {
                        self.emit(action, kind, player, entry.id.raw(), entry.cost, entry.name);
                        true
                    }
                    None => false,
                }
            }
            Command::Queue { player, unit, amount } => {
                match self.resolve(action, EntityId::UnitOrBuilding(unit)) {
                    Some(entry) => {
                        let cost = entry.cost.scaled(f64::from(amount));
                        self.emit(action, kind, player, entry.id.raw(), cost, entry.name);
                        true
                    }
                    None => false,
                }
            }
            Command::Research { player, technology } => {
                let emitted = match self.resolve(action, EntityId::Technology(technology)) {
                    Some(entry) => {
                        self.emit(action, kind, player, entry.id.raw(), entry.cost, entry.name);
                        true
                    }
                    None => false,
                };
                if technology == self.market.rates().fee_reducing_technology {
                    self.reduce_fee(action, player);
                }
                emitted
            }
            Command::Trade {
                player,
                side,
                resource,
                lots,
            } => match self.market.trade(player, side, resource, lots) {
                Ok(trade) => {
                    let name = format!("{} {}", side.name(), resource);
                    self.emit(action, kind, player, 0, trade.delta, name);
                    true
                }
                Err(err) => {
                    self.report(
                        action,
                        DiagnosticKind::RejectedTrade,
                        format!("cannot {} {}: {}", side.name(), resource, err),
                        Some(action.raw_payload()),
                    );
                    false
                }
            },
        }
    }

    /// Look up a catalog entry, reporting a miss
    fn resolve(&mut self, action: &ReplayAction, id: EntityId) -> Option<CostEntry> {
        match self.catalog.lookup(id) {
            Ok(entry) => Some(entry.clone()),
            Err(err) => {
                self.report(
                    action,
                    DiagnosticKind::CatalogMiss,
                    err.to_string(),
                    Some(action.raw_payload()),
                );
                None
            }
        }
    }

    fn reduce_fee(&mut self, action: &ReplayAction, player: PlayerId) {
        match self.market.apply_fee_reduction(player, action.timestamp) {
            FeeChange::Reduced { from, to } => self.report(
                action,
                DiagnosticKind::FeeReduced,
                format!("market fee reduced from {:.0}% to {:.0}%", from * 100.0, to * 100.0),
                None,
            ),
            FeeChange::AlreadyReduced { since, fee } => self.report(
                action,
                DiagnosticKind::DuplicateFeeReduction,
                format!(
                    "fee already reduced to {:.0}% at {} ms, research ignored",
                    fee * 100.0,
                    since
                ),
                None,
            ),
        }
    }

    fn emit(
        &mut self,
        action: &ReplayAction,
        kind: &ActionKind,
        player: PlayerId,
        entity_id: u32,
        delta: ResourceVector,
        name: String,
    ) {
        tracing::debug!(
            "{} {} player {} id {}: {} ({})",
            action.timestamp,
            kind,
            player,
            entity_id,
            delta,
            name
        );
        self.ledger.push(ExpenseRecord {
            timestamp: action.timestamp,
            action: kind.tag().to_string(),
            player,
            entity_id,
            delta,
            name,
            prices: Some(self.market.prices()),
        });
    }
}
