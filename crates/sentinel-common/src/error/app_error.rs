//! Application error types
//!
//! Unified error handling above the domain layer.

use sentinel_core::DomainError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get error code for structured logging
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => {
                if e.is_permission_denied() {
                    "PERMISSION_DENIED"
                } else if e.is_misconfiguration() {
                    "MISCONFIGURATION"
                } else if e.is_transient() {
                    "TRANSIENT_FETCH"
                } else {
                    "DOMAIN_ERROR"
                }
            }
        }
    }

    /// Whether the failure is expected to clear on a later cycle
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_transient())
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias using `AppError`
pub type AppResult<T> = Result<T, AppError>;
