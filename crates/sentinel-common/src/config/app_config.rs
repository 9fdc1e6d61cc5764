//! Application configuration structs
//!
//! Loads configuration from environment variables (with `.env` support).
//! Ids of the home guild, anchor message, and verification role are required;
//! everything else has a default.

use serde::Deserialize;
use std::env;

use sentinel_core::{RolePriorityList, Snowflake};

/// Main sentinel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelConfig {
    pub app: AppSettings,
    /// The one guild the reconciliation core operates against; events from
    /// any other guild are inert
    pub home_guild_id: Snowflake,
    pub verification: VerificationConfig,
    pub nickname: NicknameConfig,
    pub presence: PresenceConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Reaction verification watcher settings
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Channel containing the anchor message
    pub channel_id: Snowflake,
    /// The anchor message whose reactions are polled
    pub message_id: Snowflake,
    /// Role granted on approval reaction
    pub role_id: Snowflake,
    #[serde(default = "default_verify_emoji")]
    pub emoji: String,
    #[serde(default = "default_verify_poll_interval")]
    pub poll_interval_secs: u64,
}

/// Nickname synchronizer settings
#[derive(Debug, Clone, Deserialize)]
pub struct NicknameConfig {
    /// Token composed in front of the bracketed role name
    #[serde(default)]
    pub prefix_token: String,
    /// Role ids, highest priority first
    #[serde(default)]
    pub role_priority: Vec<Snowflake>,
}

impl NicknameConfig {
    /// Priority list view over the configured role ids
    pub fn priority_list(&self) -> RolePriorityList {
        self.role_priority.iter().copied().collect()
    }
}

/// Status rotation settings
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_presence_interval")]
    pub rotate_interval_secs: u64,
    /// Template for the member-count status; `{count}` is substituted
    #[serde(default = "default_presence_primary")]
    pub primary_template: String,
    /// Alternate status shown every other tick
    #[serde(default = "default_presence_secondary")]
    pub secondary_text: String,
}

// Default value functions
fn default_app_name() -> String {
    "guild-sentinel".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_verify_emoji() -> String {
    "\u{2705}".to_string() // ✅
}

fn default_verify_poll_interval() -> u64 {
    3
}

fn default_presence_interval() -> u64 {
    30
}

fn default_presence_primary() -> String {
    "Watching over {count} members".to_string()
}

fn default_presence_secondary() -> String {
    "Guarding the guild".to_string()
}

impl SentinelConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or
    /// unparsable
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            home_guild_id: required_snowflake("GUILD_ID")?,
            verification: VerificationConfig {
                channel_id: required_snowflake("VERIFY_CHANNEL_ID")?,
                message_id: required_snowflake("VERIFY_MESSAGE_ID")?,
                role_id: required_snowflake("VERIFY_ROLE_ID")?,
                emoji: env::var("VERIFY_EMOJI").unwrap_or_else(|_| default_verify_emoji()),
                poll_interval_secs: env::var("VERIFY_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_verify_poll_interval),
            },
            nickname: NicknameConfig {
                prefix_token: env::var("NICKNAME_PREFIX_TOKEN").unwrap_or_default(),
                role_priority: env::var("ROLE_PRIORITY")
                    .ok()
                    .map(|s| parse_snowflake_list("ROLE_PRIORITY", &s))
                    .transpose()?
                    .unwrap_or_default(),
            },
            presence: PresenceConfig {
                rotate_interval_secs: env::var("PRESENCE_ROTATE_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_presence_interval),
                primary_template: env::var("PRESENCE_PRIMARY_TEMPLATE")
                    .unwrap_or_else(|_| default_presence_primary()),
                secondary_text: env::var("PRESENCE_SECONDARY_TEXT")
                    .unwrap_or_else(|_| default_presence_secondary()),
            },
        })
    }
}

fn required_snowflake(name: &'static str) -> Result<Snowflake, ConfigError> {
    let raw = env::var(name).map_err(|_| ConfigError::MissingVar(name))?;
    Snowflake::parse(raw.trim()).map_err(|_| ConfigError::InvalidValue(name, raw))
}

fn parse_snowflake_list(name: &'static str, raw: &str) -> Result<Vec<Snowflake>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Snowflake::parse(s).map_err(|_| ConfigError::InvalidValue(name, s.to_string())))
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
