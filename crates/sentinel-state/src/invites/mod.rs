//! Invite usage snapshots and inviter tallies

mod invite_ledger;

pub use invite_ledger::InviteLedger;
