//! Notification events
//!
//! Defines all event types broadcast to kiosks and staff consoles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A PC was claimed by a new session
    SessionStarted(SessionStartedEvent),
    /// Paid time was added to a session
    SessionExtended(SessionExtendedEvent),
    /// Session paused, resumed, terminated or completed
    SessionStatusChanged(SessionStatusChangedEvent),
    /// Remaining time crossed a warning threshold
    SessionExpiryWarning(SessionExpiryWarningEvent),
    /// Countdown reached zero and the session was completed
    SessionExpired(SessionExpiredEvent),
    /// PC status changed (occupancy or maintenance)
    PcStatusChanged(PcStatusChangedEvent),
    /// New order placed
    OrderPlaced(OrderPlacedEvent),
    /// Order moved along the fulfilment chain
    OrderStatusChanged(OrderStatusChangedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SessionStarted(_) => "session_started",
            Event::SessionExtended(_) => "session_extended",
            Event::SessionStatusChanged(_) => "session_status_changed",
            Event::SessionExpiryWarning(_) => "session_expiry_warning",
            Event::SessionExpired(_) => "session_expired",
            Event::PcStatusChanged(_) => "pc_status_changed",
            Event::OrderPlaced(_) => "order_placed",
            Event::OrderStatusChanged(_) => "order_status_changed",
        }
    }

    /// Get the PC the event concerns, if known
    pub fn pc_id(&self) -> Option<i32> {
        match self {
            Event::SessionStarted(e) => Some(e.pc_id),
            Event::SessionExtended(e) => Some(e.pc_id),
            Event::SessionStatusChanged(e) => Some(e.pc_id),
            Event::SessionExpiryWarning(e) => Some(e.pc_id),
            Event::SessionExpired(e) => Some(e.pc_id),
            Event::PcStatusChanged(e) => Some(e.pc_id),
            Event::OrderPlaced(_) | Event::OrderStatusChanged(_) => None,
        }
    }

    /// Get the session the event concerns, if any
    pub fn session_id(&self) -> Option<i32> {
        match self {
            Event::SessionStarted(e) => Some(e.session_id),
            Event::SessionExtended(e) => Some(e.session_id),
            Event::SessionStatusChanged(e) => Some(e.session_id),
            Event::SessionExpiryWarning(e) => Some(e.session_id),
            Event::SessionExpired(e) => Some(e.session_id),
            Event::PcStatusChanged(_) => None,
            Event::OrderPlaced(e) => Some(e.session_id),
            Event::OrderStatusChanged(e) => Some(e.session_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartedEvent {
    pub session_id: i32,
    pub pc_id: i32,
    pub user_id: i32,
    pub end_time: DateTime<Utc>,
    pub payment_amount: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExtendedEvent {
    pub session_id: i32,
    pub pc_id: i32,
    pub extra_minutes: i32,
    /// Amount charged for this extension, in cents
    pub amount: i64,
    pub payment_method: String,
    pub end_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusChangedEvent {
    pub session_id: i32,
    pub pc_id: i32,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExpiryWarningEvent {
    pub session_id: i32,
    pub pc_id: i32,
    pub threshold_secs: i64,
    pub remaining_secs: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExpiredEvent {
    pub session_id: i32,
    pub pc_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcStatusChangedEvent {
    pub pc_id: i32,
    pub number: i32,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order_id: i32,
    pub session_id: i32,
    pub total_amount: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order_id: i32,
    pub session_id: i32,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
