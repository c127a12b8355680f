//! In-process audit bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`AuditBus`] is shared via `Arc<AuditBus>`: the planner holds it as its
//! audit sink and the persistence task subscribes to it.

use staffboard_core::audit::{AuditEvent, AuditSink};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

pub struct AuditBus {
    sender: broadcast::Sender<AuditEvent>,
}

impl AuditBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. With none, the event is dropped.
    pub fn publish(&self, event: AuditEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Audit event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuditBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl AuditSink for AuditBus {
    fn log_event(&self, event: AuditEvent) {
        self.publish(event);
    }
}
