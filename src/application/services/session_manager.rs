//! Session lifecycle: start, extend, pause/resume, terminate, complete
//!
//! Every state change is a single conditional write (or a single
//! transaction when the PC changes too), so two callers racing on the same
//! session or PC never both succeed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::resource_pool::ResourcePool;
use crate::domain::pricing::BillingCalculator;
use crate::domain::session::{PaymentMethod, Session, SessionStatus};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::notifications::{
    Event, SessionExtendedEvent, SessionStartedEvent, SessionStatusChangedEvent, SharedEventBus,
};
use crate::shared::errors::DomainError;
use crate::shared::retry::{retry_with_backoff, RetryConfig};

/// Result of [`SessionManager::complete`]
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub session: Session,
    /// `false` when the session was already terminal and nothing changed
    pub applied: bool,
}

pub struct SessionManager {
    repos: Arc<dyn RepositoryProvider>,
    pool: Arc<ResourcePool>,
    billing: BillingCalculator,
    events: SharedEventBus,
    retry: RetryConfig,
}

impl SessionManager {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        pool: Arc<ResourcePool>,
        billing: BillingCalculator,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            pool,
            billing,
            events,
            retry: RetryConfig::default(),
        }
    }

    pub fn billing(&self) -> &BillingCalculator {
        &self.billing
    }

    pub async fn get(&self, session_id: i32) -> DomainResult<Session> {
        self.repos
            .sessions()
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Session", session_id))
    }

    /// Live (active or paused) sessions, soonest-ending first.
    pub async fn live_sessions(&self) -> DomainResult<Vec<Session>> {
        self.repos.sessions().find_live().await
    }

    pub async fn active_session_for_pc(&self, pc_id: i32) -> DomainResult<Option<Session>> {
        self.repos.sessions().find_live_for_pc(pc_id).await
    }

    pub async fn active_session_for_user(&self, user_id: i32) -> DomainResult<Option<Session>> {
        self.repos.sessions().find_live_for_user(user_id).await
    }

    pub async fn start(
        &self,
        user_id: i32,
        pc_id: i32,
        duration_minutes: i32,
        payment_method: PaymentMethod,
    ) -> DomainResult<Session> {
        self.start_at(user_id, pc_id, duration_minutes, payment_method, Utc::now())
            .await
    }

    /// Claim the PC, price the duration and open the session in one
    /// transaction. Fails with `ResourceUnavailable` if the PC is not free.
    pub async fn start_at(
        &self,
        user_id: i32,
        pc_id: i32,
        duration_minutes: i32,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> DomainResult<Session> {
        let price = self.billing.price_for(duration_minutes)?;

        if self.repos.customers().find_by_id(user_id).await?.is_none() {
            return Err(DomainError::not_found("Customer", user_id));
        }

        let session = self
            .pool
            .claim(Session::new(
                user_id,
                pc_id,
                duration_minutes,
                payment_method,
                price,
                now,
            ))
            .await?;

        metrics::counter!("lounge_sessions_started_total").increment(1);
        info!(
            session_id = session.id,
            pc_id,
            user_id,
            duration_minutes,
            amount = price,
            payment_method = %payment_method,
            "Session started"
        );

        self.events.publish(Event::SessionStarted(SessionStartedEvent {
            session_id: session.id,
            pc_id,
            user_id,
            end_time: session.end_time,
            payment_amount: session.payment_amount,
            timestamp: now,
        }));

        Ok(session)
    }

    /// Add paid time to a live session. `duration_minutes`, `end_time` and
    /// `payment_amount` move together in one conditional write; a lost race
    /// is retried against fresh state.
    pub async fn extend(
        &self,
        session_id: i32,
        extra_minutes: i32,
        payment_method: PaymentMethod,
    ) -> DomainResult<Session> {
        let price = self.billing.price_for(extra_minutes)?;

        let session = retry_with_backoff(
            &self.retry,
            || async move {
                let mut session = self.get(session_id).await?;
                let (status, duration) = (session.status, session.duration_minutes);
                session.extend(extra_minutes, price)?;
                if !self
                    .repos
                    .sessions()
                    .update_live(&session, status, duration)
                    .await?
                {
                    return Err(concurrent_update(session_id));
                }
                Ok(session)
            },
            DomainError::is_transient,
            "session_extend",
        )
        .await?;

        metrics::counter!("lounge_session_extensions_total").increment(1);
        info!(
            session_id,
            pc_id = session.pc_id,
            extra_minutes,
            amount = price,
            payment_method = %payment_method,
            total_minutes = session.duration_minutes,
            "Session extended"
        );

        self.events
            .publish(Event::SessionExtended(SessionExtendedEvent {
                session_id,
                pc_id: session.pc_id,
                extra_minutes,
                amount: price,
                payment_method: payment_method.to_string(),
                end_time: session.end_time,
                timestamp: Utc::now(),
            }));

        Ok(session)
    }

    /// Pause an active session. The countdown keeps running.
    pub async fn pause(&self, session_id: i32) -> DomainResult<Session> {
        self.toggle(session_id, Session::pause, "session_pause")
            .await
    }

    pub async fn resume(&self, session_id: i32) -> DomainResult<Session> {
        self.toggle(session_id, Session::resume, "session_resume")
            .await
    }

    async fn toggle(
        &self,
        session_id: i32,
        apply: fn(&mut Session) -> Result<(), DomainError>,
        op: &'static str,
    ) -> DomainResult<Session> {
        let session = retry_with_backoff(
            &self.retry,
            || async move {
                let mut session = self.get(session_id).await?;
                let (status, duration) = (session.status, session.duration_minutes);
                apply(&mut session)?;
                if !self
                    .repos
                    .sessions()
                    .update_live(&session, status, duration)
                    .await?
                {
                    return Err(concurrent_update(session_id));
                }
                Ok(session)
            },
            DomainError::is_transient,
            op,
        )
        .await?;

        info!(session_id, pc_id = session.pc_id, status = %session.status, "Session status changed");
        self.publish_status(&session);
        Ok(session)
    }

    pub async fn terminate(&self, session_id: i32) -> DomainResult<Session> {
        self.terminate_at(session_id, Utc::now()).await
    }

    /// Operator cancellation. Releases the PC in the same transaction.
    pub async fn terminate_at(&self, session_id: i32, now: DateTime<Utc>) -> DomainResult<Session> {
        let mut session = self.get(session_id).await?;
        session.terminate(now)?;

        let closed = self
            .pool
            .release(&session, SessionStatus::Terminated, now)
            .await?;
        let session = self.get(session_id).await?;
        if !closed {
            // Closed by someone else in between
            return Err(DomainError::invalid_transition(
                "Session",
                session_id,
                session.status,
                "terminate",
            ));
        }

        self.record_close(&session);
        Ok(session)
    }

    pub async fn complete(&self, session_id: i32) -> DomainResult<Completion> {
        self.complete_at(session_id, Utc::now()).await
    }

    /// Mark a session completed and release its PC. Safe to call any number
    /// of times, concurrently: only the first call has an effect.
    pub async fn complete_at(
        &self,
        session_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<Completion> {
        let session = self.get(session_id).await?;
        if session.is_terminal() {
            return Ok(Completion {
                session,
                applied: false,
            });
        }

        let applied = self
            .pool
            .release(&session, SessionStatus::Completed, now)
            .await?;
        let session = self.get(session_id).await?;
        if applied {
            self.record_close(&session);
        }
        Ok(Completion { session, applied })
    }

    fn record_close(&self, session: &Session) {
        metrics::counter!("lounge_sessions_closed_total", "status" => session.status.as_str())
            .increment(1);
        info!(
            session_id = session.id,
            pc_id = session.pc_id,
            status = %session.status,
            "Session closed, PC released"
        );
        self.publish_status(session);
    }

    fn publish_status(&self, session: &Session) {
        self.events
            .publish(Event::SessionStatusChanged(SessionStatusChangedEvent {
                session_id: session.id,
                pc_id: session.pc_id,
                status: session.status.to_string(),
                timestamp: Utc::now(),
            }));
    }
}

fn concurrent_update(session_id: i32) -> DomainError {
    DomainError::Conflict(format!("Concurrent update of session {}", session_id))
}
