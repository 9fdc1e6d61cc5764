//! Member entity - read-only mirror of a user's membership in a guild
//!
//! The platform owns this state; the sentinel only observes it. Handlers
//! re-fetch members through the gateway instead of trusting copies captured
//! before an await point.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Guild member as observed through the platform gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    /// Raw account name, always present
    pub username: String,
    /// Platform-level display name, shared across guilds
    pub global_name: Option<String>,
    /// Per-guild nickname, the only field this process writes back
    pub nickname: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub is_bot: bool,
    pub joined_at: DateTime<Utc>,
}

impl GuildMember {
    /// Create a member mirror with no roles and no display overrides
    pub fn new(guild_id: Snowflake, user_id: Snowflake, username: impl Into<String>) -> Self {
        Self {
            guild_id,
            user_id,
            username: username.into(),
            global_name: None,
            nickname: None,
            role_ids: Vec::new(),
            is_bot: false,
            joined_at: Utc::now(),
        }
    }

    /// Effective display name: global name, then nickname, then username
    pub fn effective_name(&self) -> &str {
        self.global_name
            .as_deref()
            .or(self.nickname.as_deref())
            .unwrap_or(&self.username)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Compare role membership as sets, ignoring order
    pub fn has_same_roles(&self, other: &GuildMember) -> bool {
        let mine: HashSet<Snowflake> = self.role_ids.iter().copied().collect();
        let theirs: HashSet<Snowflake> = other.role_ids.iter().copied().collect();
        mine == theirs
    }

    /// Get number of roles
    #[inline]
    pub fn role_count(&self) -> usize {
        self.role_ids.len()
    }
}
