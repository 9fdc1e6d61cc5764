//! Reaction verification watcher
//!
//! Polls the approval reactions on the anchor message and grants the
//! verification role to each newly-seen reactor exactly once per process
//! lifetime. Reaction removal is intentionally not un-done; grants are
//! one-directional.

use sentinel_core::events::MemberVerifiedEvent;
use sentinel_core::Snowflake;
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::nickname::NicknameService;

/// Reaction verification service
pub struct VerificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationService<'a> {
    /// Create a new VerificationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// One poll cycle: snapshot the reactor set, process the delta
    ///
    /// A fetch failure propagates before the ledger is touched, so a
    /// transient outage never corrupts the diff baseline. The first cycle
    /// after startup only captures the baseline (the ledger suppresses its
    /// delta). Returns how many members were verified this cycle.
    #[instrument(skip(self))]
    pub async fn poll(&self) -> ServiceResult<u32> {
        let config = &self.ctx.config().verification;

        let current = self
            .ctx
            .gateway()
            .fetch_reactors(config.channel_id, config.message_id, &config.emoji)
            .await?;

        let delta = self.ctx.reactions().observe(current);
        if delta.is_empty() {
            return Ok(0);
        }

        debug!(fresh_reactors = delta.len(), "Reaction delta found");

        let mut verified = 0;
        for user_id in delta {
            if self.ctx.reactions().is_processed(user_id) {
                continue;
            }
            match self.process_reactor(user_id).await {
                Ok(true) => verified += 1,
                Ok(false) => {}
                // One failed member never aborts the rest of the delta
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Reactor left unprocessed");
                }
            }
        }

        Ok(verified)
    }

    /// Grant the verification role to one fresh reactor
    ///
    /// Member-left is a non-fatal skip. Permission-denied on the grant is
    /// logged and not retried; the id still enters the processed set.
    async fn process_reactor(&self, user_id: Snowflake) -> ServiceResult<bool> {
        let guild_id = self.ctx.home_guild_id();
        let role_id = self.ctx.config().verification.role_id;

        let Some(member) = self.ctx.gateway().fetch_member(guild_id, user_id).await? else {
            debug!(user_id = %user_id, "Reactor left the guild before verification");
            return Ok(false);
        };

        if !member.has_role(role_id) {
            match self.ctx.gateway().grant_role(guild_id, user_id, role_id).await {
                Ok(()) => {}
                Err(e) if e.is_permission_denied() => {
                    warn!(user_id = %user_id, error = %e, "Verification grant rejected");
                    self.ctx.reactions().mark_processed(user_id);
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.ctx.reactions().mark_processed(user_id);

        info!(user_id = %user_id, role_id = %role_id, "Member verified");
        self.ctx
            .events()
            .publish(MemberVerifiedEvent::now(guild_id, user_id, role_id));

        // The grant changed the role set: re-read live state for the prefix
        match self.ctx.gateway().fetch_member(guild_id, user_id).await {
            Ok(Some(live)) => {
                let nickname = NicknameService::new(self.ctx);
                if let Err(e) = nickname.sync_member(&live).await {
                    warn!(user_id = %user_id, error = %e, "Post-grant nickname sync failed");
                }
            }
            Ok(None) => {
                debug!(user_id = %user_id, "Member left right after verification");
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Post-grant member re-read failed");
            }
        }

        Ok(true)
    }
}
