//! Session repository interface
//!
//! Operations that touch both a session and its PC run in a single
//! datastore transaction so the two never diverge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Session, SessionStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Claim the session's PC (available -> occupied) and insert the
    /// session in one transaction. Fails with `ResourceUnavailable` when the
    /// PC is not available; nothing is written in that case.
    async fn open(&self, session: Session) -> DomainResult<Session>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Session>>;

    /// The non-terminal session holding a PC, if any.
    async fn find_live_for_pc(&self, pc_id: i32) -> DomainResult<Option<Session>>;

    /// The most recent non-terminal session of a customer, if any.
    async fn find_live_for_user(&self, user_id: i32) -> DomainResult<Option<Session>>;

    /// All non-terminal sessions, soonest-ending first.
    async fn find_live(&self) -> DomainResult<Vec<Session>>;

    async fn find_started_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Session>>;

    /// Persist status/duration/end/amount of a live session, provided the
    /// stored row still has `expected_status` and `expected_duration`.
    /// Returns `false` when the row changed underneath.
    async fn update_live(
        &self,
        session: &Session,
        expected_status: SessionStatus,
        expected_duration: i32,
    ) -> DomainResult<bool>;

    /// Move a live session to a terminal status and release its PC in one
    /// transaction. Returns `false` (nothing written) when the session was
    /// not in one of `from`.
    async fn close(
        &self,
        id: i32,
        status: SessionStatus,
        from: &[SessionStatus],
        ended_at: DateTime<Utc>,
    ) -> DomainResult<bool>;
}
