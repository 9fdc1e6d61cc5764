//! Invite attribution tracker
//!
//! Diffs invite-use-count snapshots to attribute each join to the invite it
//! came in through. The platform never says which invite a join used; the
//! only signal is a count that moved between two captures.

use sentinel_core::events::{AttributionUnknownEvent, InviteAttributedEvent};
use sentinel_core::{Attribution, GuildMember, InviterStats, Snowflake};
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Invite attribution service
pub struct AttributionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AttributionService<'a> {
    /// Create a new AttributionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Fetch the live invite list and replace the stored snapshot
    ///
    /// Called at startup, on invite-create, on invite-delete, and after each
    /// join attribution. A fetch failure propagates before the snapshot is
    /// touched, so the stale-but-consistent baseline survives.
    #[instrument(skip(self))]
    pub async fn refresh_snapshot(&self, guild_id: Snowflake) -> ServiceResult<()> {
        if !self.ctx.is_home_guild(guild_id) {
            return Ok(());
        }

        let live = self.ctx.gateway().fetch_invite_usage(guild_id).await?;
        self.ctx.invites().replace_snapshot(guild_id, &live);
        Ok(())
    }

    /// Attribute a join by comparing live counts against the pre-join snapshot
    ///
    /// No count increase (vanity URL, server discovery, or a race lost to a
    /// concurrent join) is `Unknown`: recorded, published, but no counter is
    /// touched. Either way the snapshot is replaced with the list fetched at
    /// join time so the next join compares against up-to-date counts.
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn handle_member_join(&self, member: &GuildMember) -> ServiceResult<Attribution> {
        let guild_id = member.guild_id;
        if !self.ctx.is_home_guild(guild_id) {
            return Ok(Attribution::Unknown);
        }

        let live = self.ctx.gateway().fetch_invite_usage(guild_id).await?;
        let attribution = self.ctx.invites().attribute(guild_id, &live);

        match &attribution {
            Attribution::Credited { inviter_id, code } => {
                self.ctx.invites().record_join(guild_id, *inviter_id);
                info!(inviter_id = %inviter_id, code = %code, "Join attributed");
                self.ctx.events().publish(InviteAttributedEvent::now(
                    guild_id,
                    member.user_id,
                    *inviter_id,
                    code.clone(),
                ));
            }
            Attribution::Unknown => {
                info!("Join not attributable to any invite");
                self.ctx
                    .events()
                    .publish(AttributionUnknownEvent::now(guild_id, member.user_id));
            }
        }

        self.ctx.invites().replace_snapshot(guild_id, &live);
        Ok(attribution)
    }

    /// Account for a departure
    ///
    /// No causal signal links a leave to an inviter; some inviter with
    /// surplus joins absorbs the charge. Returns who was charged, if anyone.
    #[instrument(skip(self))]
    pub async fn handle_member_leave(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Option<Snowflake>> {
        if !self.ctx.is_home_guild(guild_id) {
            return Ok(None);
        }

        let charged = self.ctx.invites().charge_leave(guild_id);
        match charged {
            Some(inviter_id) => {
                debug!(user_id = %user_id, inviter_id = %inviter_id, "Leave charged (heuristic)");
            }
            None => {
                debug!(user_id = %user_id, "Leave left unattributed, no inviter has surplus");
            }
        }
        Ok(charged)
    }

    /// Invite-created notification: counts shifted, re-baseline
    pub async fn handle_invite_created(&self, guild_id: Snowflake) -> ServiceResult<()> {
        self.refresh_snapshot(guild_id).await
    }

    /// Invite-deleted notification: counts shifted, re-baseline
    pub async fn handle_invite_deleted(&self, guild_id: Snowflake) -> ServiceResult<()> {
        self.refresh_snapshot(guild_id).await
    }

    /// Tallies for one inviter
    pub fn inviter_stats(&self, guild_id: Snowflake, inviter_id: Snowflake) -> Option<InviterStats> {
        self.ctx.invites().stats_for(guild_id, inviter_id)
    }

    /// Inviter ranking for display, most joins first
    ///
    /// Leave counts are heuristic, not causal; surface them as approximate.
    pub fn approximate_leaderboard(&self, guild_id: Snowflake) -> Vec<(Snowflake, InviterStats)> {
        self.ctx.invites().ranking(guild_id)
    }
}
