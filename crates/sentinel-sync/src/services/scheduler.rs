//! Reconciliation scheduler
//!
//! Owns the polling cadence. Each watcher runs in its own task around a
//! `tokio::time::interval`; awaiting the poll future inside the loop is what
//! guarantees two invocations of the same watcher never overlap, and
//! `MissedTickBehavior::Delay` turns an over-long poll into a delayed next
//! tick instead of a burst. Poll failures are logged here and otherwise
//! swallowed: the snapshot keeps its last consistent value and the next tick
//! proceeds.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::attribution::AttributionService;
use super::context::ServiceContext;
use super::presence::StatusRotator;
use super::verification::VerificationService;

/// Drives the watcher poll loops
pub struct PollScheduler {
    ctx: Arc<ServiceContext>,
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PollScheduler {
    /// Create a scheduler over a shared context
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            ctx,
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Prime baselines and spawn all poll loops
    ///
    /// The invite snapshot is captured once up front so the first join diffs
    /// against real counts; the reaction baseline is captured by the first
    /// poll cycle itself (the ledger suppresses that cycle's delta).
    pub async fn start(&self) {
        let attribution = AttributionService::new(&self.ctx);
        if let Err(e) = attribution.refresh_snapshot(self.ctx.home_guild_id()).await {
            warn!(
                error = %e,
                "Startup invite snapshot failed; joins until the next refresh may be unattributed"
            );
        }

        self.spawn_verification_loop();
        self.spawn_presence_loop();

        info!(
            verify_interval_secs = self.ctx.config().verification.poll_interval_secs,
            presence_interval_secs = self.ctx.config().presence.rotate_interval_secs,
            "Reconciliation scheduler started"
        );
    }

    /// Request all loops to stop after their current cycle
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for every loop task to finish
    pub async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn spawn_verification_loop(&self) {
        let ctx = Arc::clone(&self.ctx);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period =
            Duration::from_secs(self.ctx.config().verification.poll_interval_secs.max(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let service = VerificationService::new(&ctx);
                        if let Err(e) = service.poll().await {
                            warn!(
                                watcher = "verification",
                                error = %e,
                                "Poll failed; snapshot left unchanged"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!(watcher = "verification", "Poll loop stopped");
        });

        self.handles.lock().push(handle);
    }

    fn spawn_presence_loop(&self) {
        let rotator = StatusRotator::new(Arc::clone(&self.ctx));
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period =
            Duration::from_secs(self.ctx.config().presence.rotate_interval_secs.max(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = rotator.rotate().await {
                            warn!(watcher = "presence", error = %e, "Rotation failed");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!(watcher = "presence", "Rotation loop stopped");
        });

        self.handles.lock().push(handle);
    }
}
