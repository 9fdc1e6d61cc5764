//! # sentinel-state
//!
//! Process-local state for the reconciliation core. Everything here is
//! in-memory only: rebuilt at startup, torn down at shutdown, no persistence
//! guarantee. Already-applied platform state (granted roles, written
//! nicknames) survives restarts on the platform side and is inspected live
//! instead of being remembered here.
//!
//! ## Stores
//!
//! - **Reaction ledger**: previous reactor snapshot + processed set for the
//!   verification watcher
//! - **Invite ledger**: per-guild invite-use snapshots and inviter tallies
//! - **Event bus**: in-process fan-out of domain events to the
//!   command/formatting layer

pub mod bus;
pub mod invites;
pub mod reactions;

// Re-export store types
pub use bus::EventBus;
pub use invites::InviteLedger;
pub use reactions::{ReactionLedger, WatchPhase};
