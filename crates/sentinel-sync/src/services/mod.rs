//! Reconciliation services
//!
//! Each service consumes one polling or event source and produces idempotent
//! corrective actions. The nickname synchronizer is the only writer of
//! externally-visible identity state and depends on none of the others.

pub mod attribution;
pub mod context;
pub mod error;
pub mod nickname;
pub mod presence;
pub mod scheduler;
pub mod verification;

// Re-export all services for convenience
pub use attribution::AttributionService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use nickname::{NicknameService, ResyncReport, SyncOutcome};
pub use presence::StatusRotator;
pub use scheduler::PollScheduler;
pub use verification::VerificationService;
