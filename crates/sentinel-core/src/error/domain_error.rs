//! Domain errors - failures observed at the platform boundary

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Transient fetch failures - retried implicitly on the next cycle
    // =========================================================================
    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(Snowflake),

    #[error("Guild unreachable: {0}")]
    GuildUnreachable(Snowflake),

    #[error("Member not found in guild {guild_id}: {user_id}")]
    MemberNotFound {
        guild_id: Snowflake,
        user_id: Snowflake,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    // =========================================================================
    // Permission failures - logged per subject, never retried
    // =========================================================================
    #[error("Permission denied: {action}")]
    PermissionDenied { action: String },

    // =========================================================================
    // Structural misconfiguration - logged repeatedly, polling continues
    // =========================================================================
    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    // =========================================================================
    // Everything else
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Create a permission-denied error for an action description
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Expected to succeed on a later cycle without intervention
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::MessageNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::GuildUnreachable(_)
                | Self::MemberNotFound { .. }
                | Self::Transport(_)
        )
    }

    /// The platform rejected a write for lack of permission
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Configuration points at something that does not exist
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, Self::RoleNotFound(_))
    }
}
