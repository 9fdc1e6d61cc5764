//! Reaction snapshot ledger

mod reaction_ledger;

pub use reaction_ledger::{ReactionLedger, WatchPhase};
