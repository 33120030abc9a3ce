//! SSE handler over the in-process event bus

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tracing::{info, warn};

use crate::notifications::{EventMessage, EventSubscriber, SharedEventBus};

/// Optional filters; all given filters must match.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub pc_id: Option<i32>,
    pub session_id: Option<i32>,
    /// Comma-separated event types, e.g. `session_expiry_warning,session_expired`
    pub event_types: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, msg: &EventMessage) -> bool {
        if let Some(pc_id) = self.pc_id {
            if msg.event.pc_id() != Some(pc_id) {
                return false;
            }
        }
        if let Some(session_id) = self.session_id {
            if msg.event.session_id() != Some(session_id) {
                return false;
            }
        }
        if let Some(types) = &self.event_types {
            let event_type = msg.event.event_type();
            if !types.split(',').any(|t| t.trim() == event_type) {
                return false;
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct EventStreamState {
    pub event_bus: SharedEventBus,
}

/// `GET /api/v1/events`
pub async fn event_stream(
    State(state): State<EventStreamState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    info!(
        pc_id = ?filter.pc_id,
        session_id = ?filter.session_id,
        event_types = ?filter.event_types,
        "Event stream client connected"
    );

    let subscriber = state.event_bus.subscribe();
    let stream = stream::unfold((subscriber, filter), next_event);

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn next_event(
    (mut subscriber, filter): (EventSubscriber, EventFilter),
) -> Option<(Result<SseEvent, Infallible>, (EventSubscriber, EventFilter))> {
    loop {
        let msg = subscriber.recv().await?;
        if !filter.matches(&msg) {
            continue;
        }
        match SseEvent::default()
            .id(msg.id.clone())
            .event(msg.event.event_type())
            .json_data(&msg)
        {
            Ok(event) => return Some((Ok(event), (subscriber, filter))),
            Err(e) => warn!(error = %e, "Failed to encode event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::notifications::{Event, PcStatusChangedEvent, SessionExpiredEvent};

    fn expired(session_id: i32, pc_id: i32) -> EventMessage {
        EventMessage::new(Event::SessionExpired(SessionExpiredEvent {
            session_id,
            pc_id,
            timestamp: Utc::now(),
        }))
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EventFilter::default().matches(&expired(1, 2)));
    }

    #[test]
    fn filters_combine() {
        let filter = EventFilter {
            pc_id: Some(2),
            session_id: None,
            event_types: Some("session_expiry_warning, session_expired".into()),
        };
        assert!(filter.matches(&expired(1, 2)));
        assert!(!filter.matches(&expired(1, 3)));

        let pc_event = EventMessage::new(Event::PcStatusChanged(PcStatusChangedEvent {
            pc_id: 2,
            number: 2,
            status: "available".into(),
            timestamp: Utc::now(),
        }));
        assert!(!filter.matches(&pc_event));

        let by_session = EventFilter {
            session_id: Some(7),
            ..EventFilter::default()
        };
        assert!(by_session.matches(&expired(7, 1)));
        assert!(!by_session.matches(&pc_event));
    }
}
