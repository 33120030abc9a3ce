//! Notifications module
//!
//! In-process pub/sub for session, PC and order events. Kiosks and staff
//! consoles receive them over the Server-Sent-Events endpoint
//! `/api/v1/events`, optionally filtered by `pc_id` or `session_id`.
//!
//! # Usage
//! ```ignore
//! use gaming_lounge::notifications::{create_event_bus, Event, SessionExpiredEvent};
//! use chrono::Utc;
//!
//! let event_bus = create_event_bus();
//! event_bus.publish(Event::SessionExpired(SessionExpiredEvent {
//!     session_id: 12,
//!     pc_id: 3,
//!     timestamp: Utc::now(),
//! }));
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
