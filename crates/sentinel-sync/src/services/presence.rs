//! Status rotation
//!
//! Alternates the bot presence between a live protected-member-count message
//! and a configured secondary message, one flip per scheduler tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Presence rotation state
pub struct StatusRotator {
    ctx: Arc<ServiceContext>,
    showing_secondary: AtomicBool,
}

impl StatusRotator {
    /// Create a rotator starting on the member-count message
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            showing_secondary: AtomicBool::new(false),
        }
    }

    /// One rotation tick: flip which message is shown and push it
    #[instrument(skip(self))]
    pub async fn rotate(&self) -> ServiceResult<()> {
        let config = &self.ctx.config().presence;

        let secondary = self.showing_secondary.fetch_xor(true, Ordering::Relaxed);
        let text = if secondary {
            config.secondary_text.clone()
        } else {
            let count = self
                .ctx
                .gateway()
                .member_count(self.ctx.home_guild_id())
                .await?;
            config.primary_template.replace("{count}", &count.to_string())
        };

        self.ctx.gateway().update_presence(&text).await?;
        debug!(status = %text, "Presence updated");
        Ok(())
    }
}
