//! Invite ledger
//!
//! Per-guild snapshots of invite-code use counts plus the running inviter
//! join/leave tallies derived from them. Uses `DashMap` keyed by guild so
//! event callbacks and pollers can share the ledger without a global lock.

use std::collections::HashMap;

use dashmap::DashMap;
use sentinel_core::{Attribution, InviteUsage, InviterStats, Snowflake};

#[derive(Debug, Clone, Copy)]
struct CachedInvite {
    uses: u32,
    inviter_id: Option<Snowflake>,
}

/// Snapshot + tally store for invite attribution
#[derive(Debug, Default)]
pub struct InviteLedger {
    /// Guild id -> invite code -> cached usage
    snapshots: DashMap<Snowflake, HashMap<String, CachedInvite>>,
    /// Guild id -> inviter id -> tallies
    stats: DashMap<Snowflake, HashMap<Snowflake, InviterStats>>,
}

impl InviteLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot for a guild unconditionally
    pub fn replace_snapshot(&self, guild_id: Snowflake, invites: &[InviteUsage]) {
        let snapshot: HashMap<String, CachedInvite> = invites
            .iter()
            .map(|inv| {
                (
                    inv.code.clone(),
                    CachedInvite {
                        uses: inv.uses,
                        inviter_id: inv.inviter_id,
                    },
                )
            })
            .collect();

        tracing::trace!(
            guild_id = %guild_id,
            invites = snapshot.len(),
            "Invite snapshot replaced"
        );
        self.snapshots.insert(guild_id, snapshot);
    }

    /// Whether a baseline snapshot exists for the guild
    pub fn has_snapshot(&self, guild_id: Snowflake) -> bool {
        self.snapshots.contains_key(&guild_id)
    }

    /// Cached use count for one code (0 when unseen)
    pub fn cached_uses(&self, guild_id: Snowflake, code: &str) -> u32 {
        self.snapshots
            .get(&guild_id)
            .and_then(|snap| snap.get(code).map(|c| c.uses))
            .unwrap_or(0)
    }

    /// Match a live invite list against the stored snapshot
    ///
    /// Selects the first invite in `live` iteration order whose use count
    /// exceeds the cached value; a code missing from the snapshot counts as
    /// zero. Under concurrent joins more than one invite may show an
    /// increase; first match wins, best effort. Does not mutate the ledger:
    /// callers decide whether to record the join and refresh the snapshot.
    pub fn attribute(&self, guild_id: Snowflake, live: &[InviteUsage]) -> Attribution {
        for inv in live {
            let cached = self.cached_uses(guild_id, &inv.code);
            if inv.uses > cached {
                return match inv.inviter_id {
                    Some(inviter_id) => Attribution::Credited {
                        inviter_id,
                        code: inv.code.clone(),
                    },
                    // The count moved but nobody owns the invite (vanity URL)
                    None => Attribution::Unknown,
                };
            }
        }
        Attribution::Unknown
    }

    /// Credit an inviter with a join
    pub fn record_join(&self, guild_id: Snowflake, inviter_id: Snowflake) {
        self.stats
            .entry(guild_id)
            .or_default()
            .entry(inviter_id)
            .or_default()
            .record_join();
    }

    /// Charge a leave to some inviter with surplus joins
    ///
    /// There is no causal signal linking a departure to the invite it came
    /// in through; any inviter currently credited with more joins than
    /// leaves absorbs the charge. Returns the charged inviter, or `None`
    /// when nobody has surplus.
    pub fn charge_leave(&self, guild_id: Snowflake) -> Option<Snowflake> {
        let mut guild_stats = self.stats.get_mut(&guild_id)?;
        let inviter_id = guild_stats
            .iter()
            .find(|(_, stats)| stats.has_surplus())
            .map(|(id, _)| *id)?;

        if let Some(stats) = guild_stats.get_mut(&inviter_id) {
            stats.record_leave();
        }
        Some(inviter_id)
    }

    /// Tallies for one inviter
    pub fn stats_for(&self, guild_id: Snowflake, inviter_id: Snowflake) -> Option<InviterStats> {
        self.stats
            .get(&guild_id)
            .and_then(|guild| guild.get(&inviter_id).copied())
    }

    /// All inviter tallies for a guild, most joins first
    ///
    /// Leave counts in the result are heuristic (see `charge_leave`); any
    /// ranking surfaced to users should carry that caveat.
    pub fn ranking(&self, guild_id: Snowflake) -> Vec<(Snowflake, InviterStats)> {
        let mut entries: Vec<(Snowflake, InviterStats)> = self
            .stats
            .get(&guild_id)
            .map(|guild| guild.iter().map(|(id, stats)| (*id, *stats)).collect())
            .unwrap_or_default();

        entries.sort_by(|a, b| b.1.joins.cmp(&a.1.joins).then(a.0.cmp(&b.0)));
        entries
    }
}
