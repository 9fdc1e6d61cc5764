//! # sentinel-sync
//!
//! Application layer containing the reconciliation services: reaction
//! verification, invite attribution, nickname synchronization, status
//! rotation, and the poll scheduler that drives them.

pub mod services;

// Re-export the service surface at crate root
pub use services::{
    AttributionService, NicknameService, PollScheduler, ResyncReport, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, StatusRotator, SyncOutcome,
    VerificationService,
};
