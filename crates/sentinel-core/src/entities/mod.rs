//! Domain entities - mirrored platform state and reconciliation records

mod audit;
mod invite;
mod member;
mod role;

pub use audit::{AuditAction, AuditLogEntry};
pub use invite::{Attribution, InviteUsage, InviterStats};
pub use member::GuildMember;
pub use role::{Role, RolePriorityList};
