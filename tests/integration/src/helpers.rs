//! Test helpers
//!
//! Builds a ready-to-drive harness: scripted gateway, loaded configuration,
//! and a shared service context.

use std::sync::Arc;

use sentinel_common::{
    AppSettings, Environment, NicknameConfig, PresenceConfig, SentinelConfig, VerificationConfig,
};
use sentinel_core::{GuildMember, Role, Snowflake};
use sentinel_sync::ServiceContext;

use crate::fixtures::FakeGateway;

/// The home guild every scenario runs against
pub const GUILD: Snowflake = Snowflake::new(100);
/// A guild the sentinel must treat as inert
pub const OTHER_GUILD: Snowflake = Snowflake::new(101);
pub const VERIFY_CHANNEL: Snowflake = Snowflake::new(200);
pub const ANCHOR_MESSAGE: Snowflake = Snowflake::new(300);
pub const VERIFY_ROLE: Snowflake = Snowflake::new(400);
pub const STAFF_ROLE: Snowflake = Snowflake::new(401);

/// Configuration used by every harness
pub fn test_config() -> SentinelConfig {
    SentinelConfig {
        app: AppSettings {
            name: "guild-sentinel-test".to_string(),
            env: Environment::Development,
        },
        home_guild_id: GUILD,
        verification: VerificationConfig {
            channel_id: VERIFY_CHANNEL,
            message_id: ANCHOR_MESSAGE,
            role_id: VERIFY_ROLE,
            emoji: "\u{2705}".to_string(),
            poll_interval_secs: 1,
        },
        nickname: NicknameConfig {
            prefix_token: String::new(),
            // Staff outranks the verification role
            role_priority: vec![STAFF_ROLE, VERIFY_ROLE],
        },
        presence: PresenceConfig {
            rotate_interval_secs: 1,
            primary_template: "Watching over {count} members".to_string(),
            secondary_text: "Guarding the guild".to_string(),
        },
    }
}

/// Scripted gateway plus service context, wired together
pub struct TestHarness {
    pub gateway: Arc<FakeGateway>,
    pub ctx: Arc<ServiceContext>,
}

impl TestHarness {
    /// Build a harness with the tracked roles already in the world
    pub fn new() -> Self {
        let gateway = Arc::new(FakeGateway::new());
        gateway.put_role(Role::new(VERIFY_ROLE, GUILD, "Verified", 1));
        gateway.put_role(Role::new(STAFF_ROLE, GUILD, "Staff", 2));

        let ctx = ServiceContext::builder()
            .gateway(gateway.clone())
            .config(test_config())
            .build()
            .expect("test context must build");

        Self {
            gateway,
            ctx: Arc::new(ctx),
        }
    }

    /// Add a plain member of the home guild
    pub fn seed_member(&self, user_id: Snowflake, username: &str) -> GuildMember {
        let member = GuildMember::new(GUILD, user_id, username);
        self.gateway.put_member(member.clone());
        member
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
