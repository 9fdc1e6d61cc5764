//! Nickname synchronizer
//!
//! Computes the role-derived display-name prefix and applies it. This is the
//! single place that mutates externally-visible identity state; every
//! trigger path (post-grant, audit log, role-change notification, bulk
//! resync) converges on the same computation, so redundant invocations for
//! one underlying change are safe by idempotence.

use sentinel_core::events::NicknameUpdatedEvent;
use sentinel_core::{AuditLogEntry, GuildMember, Snowflake};
use tracing::{debug, info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// What applying the synchronizer to one member did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nickname written
    Updated(String),
    /// Desired name already in place, zero writes
    Unchanged,
    /// No tracked role, member gone, or write rejected
    Skipped,
}

/// Result of a bulk resynchronization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResyncReport {
    pub updated: u32,
    pub unchanged: u32,
}

/// Compose the prefixed display name
pub fn compose_nickname(token: &str, role_name: &str, base: &str) -> String {
    format!("{token}[{role_name}] {base}")
}

/// Strip this synchronizer's own prefix from a display name, if present
///
/// Anything that does not match `<token>[...] ` exactly is returned
/// untouched; stripping before composing is what keeps repeated application
/// from stacking prefixes.
pub fn strip_role_prefix<'a>(token: &str, name: &'a str) -> &'a str {
    fn strip<'b>(token: &str, name: &'b str) -> Option<&'b str> {
        let rest = name.strip_prefix(token)?.strip_prefix('[')?;
        let (_, base) = rest.split_once("] ")?;
        Some(base)
    }
    strip(token, name).unwrap_or(name)
}

/// Nickname service
pub struct NicknameService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NicknameService<'a> {
    /// Create a new NicknameService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Desired display name for a member, `None` when no tracked role applies
    ///
    /// Pure function of the member's role set, the priority list, and the
    /// member's base name; only the role-name lookup goes to the gateway.
    async fn desired_nickname(&self, member: &GuildMember) -> ServiceResult<Option<String>> {
        let config = &self.ctx.config().nickname;
        let priority = config.priority_list();

        let Some(role_id) = priority.highest_priority(&member.role_ids) else {
            return Ok(None);
        };

        let Some(role) = self.ctx.gateway().fetch_role(member.guild_id, role_id).await? else {
            // Configured priority role no longer exists; keep polling, the
            // configuration may be fixed without a restart
            warn!(
                guild_id = %member.guild_id,
                role_id = %role_id,
                "Priority role missing from guild; nickname left untouched"
            );
            return Ok(None);
        };

        let base = strip_role_prefix(&config.prefix_token, member.effective_name());
        Ok(Some(compose_nickname(
            &config.prefix_token,
            &role.name,
            base,
        )))
    }

    /// Apply the synchronizer to one member
    ///
    /// Idempotent: the write happens only when the desired name differs from
    /// the current nickname, verified by string comparison.
    /// Permission-denied is logged per member and reported as `Skipped`.
    #[instrument(skip(self, member), fields(guild_id = %member.guild_id, user_id = %member.user_id))]
    pub async fn sync_member(&self, member: &GuildMember) -> ServiceResult<SyncOutcome> {
        let Some(desired) = self.desired_nickname(member).await? else {
            return Ok(SyncOutcome::Skipped);
        };

        if member.nickname.as_deref() == Some(desired.as_str()) {
            return Ok(SyncOutcome::Unchanged);
        }

        match self
            .ctx
            .gateway()
            .set_nickname(member.guild_id, member.user_id, &desired)
            .await
        {
            Ok(()) => {
                info!(nickname = %desired, "Nickname updated");
                self.ctx.events().publish(NicknameUpdatedEvent::now(
                    member.guild_id,
                    member.user_id,
                    desired.clone(),
                ));
                Ok(SyncOutcome::Updated(desired))
            }
            Err(e) if e.is_permission_denied() => {
                warn!(error = %e, "Nickname write rejected");
                Ok(SyncOutcome::Skipped)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Role-membership-changed notification path
    ///
    /// Applies only when the before/after role sets differ, and re-reads the
    /// live member rather than trusting the notification payload.
    #[instrument(skip(self, before, after), fields(user_id = %after.user_id))]
    pub async fn on_role_change(
        &self,
        before: &GuildMember,
        after: &GuildMember,
    ) -> ServiceResult<SyncOutcome> {
        if !self.ctx.is_home_guild(after.guild_id) {
            return Ok(SyncOutcome::Skipped);
        }
        if before.has_same_roles(after) {
            return Ok(SyncOutcome::Unchanged);
        }

        match self
            .ctx
            .gateway()
            .fetch_member(after.guild_id, after.user_id)
            .await?
        {
            Some(live) => self.sync_member(&live).await,
            None => {
                debug!("Member left before nickname sync");
                Ok(SyncOutcome::Skipped)
            }
        }
    }

    /// Audit-log trigger path
    ///
    /// Commonly fires for the same change as `on_role_change`; both must be
    /// redundantly safe.
    #[instrument(skip(self, entry), fields(target = %entry.target_user_id))]
    pub async fn on_audit_log(&self, entry: &AuditLogEntry) -> ServiceResult<SyncOutcome> {
        if !self.ctx.is_home_guild(entry.guild_id) || !entry.action.is_role_change() {
            return Ok(SyncOutcome::Skipped);
        }

        match self
            .ctx
            .gateway()
            .fetch_member(entry.guild_id, entry.target_user_id)
            .await?
        {
            Some(live) => self.sync_member(&live).await,
            None => {
                debug!("Audit target no longer in guild");
                Ok(SyncOutcome::Skipped)
            }
        }
    }

    /// Bulk resynchronization over every member of the guild
    ///
    /// Per-member failures are logged and never abort the batch.
    #[instrument(skip(self))]
    pub async fn resync_all(&self, guild_id: Snowflake) -> ServiceResult<ResyncReport> {
        let members = self.ctx.gateway().list_members(guild_id).await?;
        let mut report = ResyncReport::default();

        for member in &members {
            match self.sync_member(member).await {
                Ok(SyncOutcome::Updated(_)) => report.updated += 1,
                Ok(_) => report.unchanged += 1,
                Err(e) => {
                    warn!(user_id = %member.user_id, error = %e, "Member skipped during resync");
                    report.unchanged += 1;
                }
            }
        }

        info!(
            guild_id = %guild_id,
            updated = report.updated,
            unchanged = report.unchanged,
            "Bulk nickname resync complete"
        );
        Ok(report)
    }
}
