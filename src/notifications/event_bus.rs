//! Broadcast bus feeding kiosk and staff-console listeners
//!
//! Every publisher writes into a single `tokio::sync::broadcast` ring. Slow
//! listeners skip ahead instead of blocking the services that publish.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast;

use super::events::{Event, EventMessage};

/// Ring size shared by all listeners
const RING_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    listeners: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(RING_CAPACITY)
    }

    /// Bus whose listeners start lagging after `capacity` unread events
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish to every current listener and return how many were reached.
    /// Never fails: an event nobody is listening for is simply dropped.
    pub fn publish(&self, event: Event) -> usize {
        let kind = event.event_type();
        let pc_id = event.pc_id();
        let session_id = event.session_id();
        metrics::counter!("lounge_events_published_total", "type" => kind).increment(1);

        let reached = self.sender.send(EventMessage::new(event)).unwrap_or(0);
        debug!(
            "event {} (pc={:?}, session={:?}) reached {} listener(s)",
            kind, pc_id, session_id, reached
        );
        reached
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let now = self.listeners.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Event listener attached ({} connected)", now);

        EventSubscriber {
            receiver,
            listeners: Arc::clone(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One listener's view of the bus; detaches on drop
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    listeners: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Next event, or `None` once the bus is gone. Events overwritten
    /// before this listener read them are skipped.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    metrics::counter!("lounge_events_dropped_total").increment(missed);
                    warn!("Event listener fell behind, skipped {} event(s)", missed);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let left = self.listeners.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        info!("Event listener detached ({} connected)", left);
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
