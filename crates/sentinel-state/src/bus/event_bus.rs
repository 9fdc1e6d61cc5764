//! Event bus
//!
//! Fans domain events out to in-process subscribers (the command/formatting
//! layer: join/leave embeds, verification announcements). Publishing never
//! blocks and never fails; a dropped receiver just falls off the list.

use parking_lot::Mutex;
use sentinel_core::DomainEvent;
use tokio::sync::mpsc;

/// In-process publish/subscribe channel for domain events
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<DomainEvent>>>,
}

impl EventBus {
    /// Create a bus with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and get its receiving end
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DomainEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Publish an event to every live subscriber
    pub fn publish(&self, event: DomainEvent) {
        tracing::trace!(event_type = event.event_type(), "Publishing domain event");

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
