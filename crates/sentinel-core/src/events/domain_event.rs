//! Domain events - emitted when the sentinel applies a corrective action
//!
//! These events are the outbound surface toward the command/formatting layer
//! (join/leave log embeds, verification announcements); the reconciliation
//! core itself never consumes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// All events the reconciliation core can publish
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    MemberVerified(MemberVerifiedEvent),
    InviteAttributed(InviteAttributedEvent),
    AttributionUnknown(AttributionUnknownEvent),
    NicknameUpdated(NicknameUpdatedEvent),
}

impl DomainEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MemberVerified(_) => "MEMBER_VERIFIED",
            Self::InviteAttributed(_) => "INVITE_ATTRIBUTED",
            Self::AttributionUnknown(_) => "ATTRIBUTION_UNKNOWN",
            Self::NicknameUpdated(_) => "NICKNAME_UPDATED",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MemberVerified(e) => e.at,
            Self::InviteAttributed(e) => e.at,
            Self::AttributionUnknown(e) => e.at,
            Self::NicknameUpdated(e) => e.at,
        }
    }
}

/// A reactor on the anchor message was granted the verification role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberVerifiedEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub role_id: Snowflake,
    pub at: DateTime<Utc>,
}

impl MemberVerifiedEvent {
    pub fn now(guild_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> DomainEvent {
        DomainEvent::MemberVerified(Self {
            guild_id,
            user_id,
            role_id,
            at: Utc::now(),
        })
    }
}

/// A join was attributed to a specific invite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteAttributedEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub inviter_id: Snowflake,
    pub code: String,
    pub at: DateTime<Utc>,
}

impl InviteAttributedEvent {
    pub fn now(
        guild_id: Snowflake,
        user_id: Snowflake,
        inviter_id: Snowflake,
        code: impl Into<String>,
    ) -> DomainEvent {
        DomainEvent::InviteAttributed(Self {
            guild_id,
            user_id,
            inviter_id,
            code: code.into(),
            at: Utc::now(),
        })
    }
}

/// A join could not be matched to any invite count increase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionUnknownEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub at: DateTime<Utc>,
}

impl AttributionUnknownEvent {
    pub fn now(guild_id: Snowflake, user_id: Snowflake) -> DomainEvent {
        DomainEvent::AttributionUnknown(Self {
            guild_id,
            user_id,
            at: Utc::now(),
        })
    }
}

/// A member's display name was rewritten from their role prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicknameUpdatedEvent {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: String,
    pub at: DateTime<Utc>,
}

impl NicknameUpdatedEvent {
    pub fn now(
        guild_id: Snowflake,
        user_id: Snowflake,
        nickname: impl Into<String>,
    ) -> DomainEvent {
        DomainEvent::NicknameUpdated(Self {
            guild_id,
            user_id,
            nickname: nickname.into(),
            at: Utc::now(),
        })
    }
}
