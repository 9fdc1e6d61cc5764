//! Gateway trait (port) - defines what the core reads from and writes to the
//! platform
//!
//! The domain layer defines what it needs; the excluded platform-client
//! collaborator provides the implementation. Reads return mirrored state,
//! writes may fail with `PermissionDenied`, which callers catch rather than
//! propagate.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::entities::{GuildMember, InviteUsage, Role};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Fetch the non-bot user ids currently reacting with `emoji` on a message
    async fn fetch_reactors(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &str,
    ) -> GatewayResult<HashSet<Snowflake>>;

    /// Fetch every invite of a guild with its cumulative use count
    async fn fetch_invite_usage(&self, guild_id: Snowflake) -> GatewayResult<Vec<InviteUsage>>;

    /// Fetch a single member, `None` if they are not (or no longer) in the guild
    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> GatewayResult<Option<GuildMember>>;

    /// Fetch a role, `None` if the id does not exist in the guild
    async fn fetch_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> GatewayResult<Option<Role>>;

    /// Iterate every member of the guild (paginated by the implementor)
    async fn list_members(&self, guild_id: Snowflake) -> GatewayResult<Vec<GuildMember>>;

    /// Current member count of the guild
    async fn member_count(&self, guild_id: Snowflake) -> GatewayResult<u64>;

    /// Grant a role to a member; `PermissionDenied` must be caught by callers
    async fn grant_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> GatewayResult<()>;

    /// Overwrite a member's per-guild nickname; `PermissionDenied` must be
    /// caught by callers
    async fn set_nickname(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        nickname: &str,
    ) -> GatewayResult<()>;

    /// Replace the bot's own presence text
    async fn update_presence(&self, text: &str) -> GatewayResult<()>;
}
