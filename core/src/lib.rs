//! Spendlog Core - replay expense interpreter
//!
//! Turns the decoded action stream of an Age of Empires II recording into a
//! ledger of what every player spent, and when.
//!
//! # Architecture
//!
//! - [`ReplayDocument`] / [`Timeline`] - decoded replay and its game clock
//! - [`CostCatalog`] - static cost of every unit, building and technology
//! - [`MarketState`] - commodity prices and per-player market fees
//! - [`Interpreter`] - folds actions into an [`ExpenseLedger`] plus [`Diagnostics`]
//! - [`Summary`] - per-player and per-team spending

pub mod catalog;
pub mod config;
pub mod economy;
pub mod interpreter;
pub mod ledger;
pub mod replay;
pub mod roster;

pub use catalog::{CatalogError, CostCatalog, CostEntry, EntityId, GameEdition};
pub use config::{AnalyserConfig, Config, ConfigError};
pub use economy::{
    FeeChange, MarketError, MarketPrices, MarketRates, MarketState, Resource, ResourceVector,
    TradeSide,
};
pub use interpreter::{
    ActionKind, Diagnostic, DiagnosticKind, Diagnostics, Interpretation, Interpreter, Severity,
};
pub use ledger::{ExpenseLedger, ExpenseRecord, LEDGER_COLUMNS, LedgerError, Summary};
pub use replay::{
    Operation, PlayerId, ReplayAction, ReplayDocument, ReplayError, StreamError, Timeline,
    Timestamp,
};
pub use roster::{PlayerInfo, Roster, RosterError};
