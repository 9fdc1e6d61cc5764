//! Service context - dependency container for services
//!
//! Holds the gateway port, the in-memory ledgers, the event bus, and the
//! loaded configuration. All state is process-scoped: constructed once at
//! startup, shared by reference into each service, torn down on shutdown.

use std::sync::Arc;

use sentinel_common::{AppError, AppResult, SentinelConfig};
use sentinel_core::{ChatGateway, Snowflake};
use sentinel_state::{EventBus, InviteLedger, ReactionLedger};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    gateway: Arc<dyn ChatGateway>,
    reactions: Arc<ReactionLedger>,
    invites: Arc<InviteLedger>,
    events: Arc<EventBus>,
    config: Arc<SentinelConfig>,
}

impl ServiceContext {
    /// Start building a context
    #[must_use]
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::default()
    }

    /// Platform gateway port
    pub fn gateway(&self) -> &dyn ChatGateway {
        self.gateway.as_ref()
    }

    /// Reaction snapshot ledger
    pub fn reactions(&self) -> &ReactionLedger {
        &self.reactions
    }

    /// Invite snapshot ledger
    pub fn invites(&self) -> &InviteLedger {
        &self.invites
    }

    /// Domain event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Loaded configuration
    pub fn config(&self) -> &SentinelConfig {
        &self.config
    }

    /// The one guild the core operates against
    #[inline]
    pub fn home_guild_id(&self) -> Snowflake {
        self.config.home_guild_id
    }

    /// Events for any other guild are inert
    #[inline]
    pub fn is_home_guild(&self, guild_id: Snowflake) -> bool {
        guild_id == self.config.home_guild_id
    }
}

/// Builder for `ServiceContext`
///
/// The gateway and configuration are required; ledgers and the event bus
/// default to fresh empty instances.
#[derive(Default)]
pub struct ServiceContextBuilder {
    gateway: Option<Arc<dyn ChatGateway>>,
    config: Option<Arc<SentinelConfig>>,
    reactions: Option<Arc<ReactionLedger>>,
    invites: Option<Arc<InviteLedger>>,
    events: Option<Arc<EventBus>>,
}

impl ServiceContextBuilder {
    /// Set the platform gateway implementation
    #[must_use]
    pub fn gateway(mut self, gateway: Arc<dyn ChatGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the loaded configuration
    #[must_use]
    pub fn config(mut self, config: SentinelConfig) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    /// Share a pre-built reaction ledger
    #[must_use]
    pub fn reactions(mut self, reactions: Arc<ReactionLedger>) -> Self {
        self.reactions = Some(reactions);
        self
    }

    /// Share a pre-built invite ledger
    #[must_use]
    pub fn invites(mut self, invites: Arc<InviteLedger>) -> Self {
        self.invites = Some(invites);
        self
    }

    /// Share a pre-built event bus
    #[must_use]
    pub fn events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Assemble the context
    ///
    /// # Errors
    /// Fails when the gateway or configuration is missing
    pub fn build(self) -> AppResult<ServiceContext> {
        Ok(ServiceContext {
            gateway: self
                .gateway
                .ok_or_else(|| AppError::Config("service context needs a gateway".to_string()))?,
            config: self
                .config
                .ok_or_else(|| AppError::Config("service context needs a configuration".to_string()))?,
            reactions: self.reactions.unwrap_or_default(),
            invites: self.invites.unwrap_or_default(),
            events: self.events.unwrap_or_default(),
        })
    }
}
