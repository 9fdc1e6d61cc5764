//! Reaction snapshot ledger
//!
//! Holds the previous reactor set and the processed set for the verification
//! watcher. Snapshots are compared only against the immediately preceding
//! capture, never against any ground-truth store: reactions come and go
//! between polls, and grants are one-directional.

use std::collections::HashSet;

use parking_lot::Mutex;
use sentinel_core::Snowflake;

/// Lifecycle of the watcher's snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// No snapshot captured yet
    Uninitialized,
    /// Baseline captured, steady-state diffing active
    SteadyState,
}

#[derive(Debug)]
struct LedgerState {
    phase: WatchPhase,
    previous: HashSet<Snowflake>,
    processed: HashSet<Snowflake>,
}

/// Snapshot + processed-set state for the reaction verification watcher
///
/// `observe` on a fresh ledger captures the baseline and reports no delta,
/// so reactors present before the process started are never treated as new.
#[derive(Debug)]
pub struct ReactionLedger {
    inner: Mutex<LedgerState>,
}

impl ReactionLedger {
    /// Create an empty, uninitialized ledger
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerState {
                phase: WatchPhase::Uninitialized,
                previous: HashSet::new(),
                processed: HashSet::new(),
            }),
        }
    }

    /// Feed the current reactor snapshot and get back the ids that were
    /// absent from the previous one
    ///
    /// The stored snapshot is replaced every call regardless of whether a
    /// delta was found: an id that leaves and re-enters the set is a fresh
    /// signal, one that never leaves is never reported twice. The first call
    /// only captures the baseline and returns an empty delta.
    pub fn observe(&self, current: HashSet<Snowflake>) -> Vec<Snowflake> {
        let mut state = self.inner.lock();

        let delta = match state.phase {
            WatchPhase::Uninitialized => {
                state.phase = WatchPhase::SteadyState;
                Vec::new()
            }
            WatchPhase::SteadyState => {
                let mut fresh: Vec<Snowflake> =
                    current.difference(&state.previous).copied().collect();
                // Deterministic processing order for logs and tests
                fresh.sort_unstable();
                fresh
            }
        };

        state.previous = current;
        delta
    }

    /// Current snapshot phase
    pub fn phase(&self) -> WatchPhase {
        self.inner.lock().phase
    }

    /// Whether this id was already granted in the current process lifetime
    pub fn is_processed(&self, user_id: Snowflake) -> bool {
        self.inner.lock().processed.contains(&user_id)
    }

    /// Record a grant; returns false if the id was already recorded
    pub fn mark_processed(&self, user_id: Snowflake) -> bool {
        self.inner.lock().processed.insert(user_id)
    }

    /// Number of ids granted this process lifetime
    pub fn processed_count(&self) -> usize {
        self.inner.lock().processed.len()
    }
}

impl Default for ReactionLedger {
    fn default() -> Self {
        Self::new()
    }
}
