//! SeaORM implementation of SessionRepository
//!
//! `open` and `close` touch both the session and its PC, so each runs in one
//! transaction. Everything inside a transaction goes through the transaction
//! handle, never the pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::pc_repository::move_pc;
use super::{corrupt, db_err, is_unique_violation};
use crate::domain::pc::PcStatus;
use crate::domain::session::{PaymentMethod, Session, SessionRepository, SessionStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{pc, session};

pub struct SeaOrmSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: session::Model) -> DomainResult<Session> {
    let status = SessionStatus::from_str(&m.status)
        .ok_or_else(|| corrupt("Session", "status", &m.status))?;
    let payment_method = PaymentMethod::from_str(&m.payment_method)
        .ok_or_else(|| corrupt("Session", "payment method", &m.payment_method))?;
    Ok(Session {
        id: m.id,
        user_id: m.user_id,
        pc_id: m.pc_id,
        start_time: m.start_time,
        end_time: m.end_time,
        duration_minutes: m.duration_minutes,
        status,
        payment_method,
        payment_amount: m.payment_amount,
        ended_at: m.ended_at,
    })
}

fn models_to_domain(models: Vec<session::Model>) -> DomainResult<Vec<Session>> {
    models.into_iter().map(model_to_domain).collect()
}

fn live_statuses() -> impl Iterator<Item = &'static str> {
    SessionStatus::LIVE.iter().map(|s| s.as_str())
}

// ── SessionRepository impl ──────────────────────────────────────

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn open(&self, s: Session) -> DomainResult<Session> {
        let pc_id = s.pc_id;
        let txn = self.db.begin().await.map_err(db_err)?;

        let claimed = move_pc(&txn, pc_id, &[PcStatus::Available], PcStatus::Occupied).await?;
        if !claimed {
            let exists = pc::Entity::find_by_id(pc_id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .is_some();
            txn.rollback().await.map_err(db_err)?;
            return Err(if exists {
                DomainError::ResourceUnavailable(pc_id)
            } else {
                DomainError::not_found("PC", pc_id)
            });
        }

        let model = session::ActiveModel {
            id: NotSet,
            user_id: Set(s.user_id),
            pc_id: Set(pc_id),
            start_time: Set(s.start_time),
            end_time: Set(s.end_time),
            duration_minutes: Set(s.duration_minutes),
            status: Set(s.status.as_str().to_string()),
            payment_method: Set(s.payment_method.as_str().to_string()),
            payment_amount: Set(s.payment_amount),
            ended_at: Set(s.ended_at),
        };
        let inserted = match model.insert(&txn).await {
            Ok(m) => m,
            Err(e) => {
                let err = if is_unique_violation(&e) {
                    DomainError::ResourceUnavailable(pc_id)
                } else {
                    db_err(e)
                };
                txn.rollback().await.map_err(db_err)?;
                return Err(err);
            }
        };

        txn.commit().await.map_err(db_err)?;
        debug!("Opened session {} on PC {}", inserted.id, pc_id);
        model_to_domain(inserted)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Session>> {
        let model = session::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_live_for_pc(&self, pc_id: i32) -> DomainResult<Option<Session>> {
        let model = session::Entity::find()
            .filter(session::Column::PcId.eq(pc_id))
            .filter(session::Column::Status.is_in(live_statuses()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_live_for_user(&self, user_id: i32) -> DomainResult<Option<Session>> {
        let model = session::Entity::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::Status.is_in(live_statuses()))
            .order_by_desc(session::Column::StartTime)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_live(&self) -> DomainResult<Vec<Session>> {
        let models = session::Entity::find()
            .filter(session::Column::Status.is_in(live_statuses()))
            .order_by_asc(session::Column::EndTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_started_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Session>> {
        let models = session::Entity::find()
            .filter(session::Column::StartTime.gte(since))
            .order_by_asc(session::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn update_live(
        &self,
        s: &Session,
        expected_status: SessionStatus,
        expected_duration: i32,
    ) -> DomainResult<bool> {
        let result = session::Entity::update_many()
            .col_expr(session::Column::Status, Expr::value(s.status.as_str()))
            .col_expr(
                session::Column::DurationMinutes,
                Expr::value(s.duration_minutes),
            )
            .col_expr(session::Column::EndTime, Expr::value(s.end_time))
            .col_expr(session::Column::PaymentAmount, Expr::value(s.payment_amount))
            .filter(session::Column::Id.eq(s.id))
            .filter(session::Column::Status.eq(expected_status.as_str()))
            .filter(session::Column::DurationMinutes.eq(expected_duration))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        debug!(
            "Session {} update ({} -> {}): {} row(s)",
            s.id, expected_status, s.status, result.rows_affected
        );
        Ok(result.rows_affected == 1)
    }

    async fn close(
        &self,
        id: i32,
        status: SessionStatus,
        from: &[SessionStatus],
        ended_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let Some(current) = session::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
        else {
            txn.rollback().await.map_err(db_err)?;
            return Err(DomainError::not_found("Session", id));
        };

        let closed = session::Entity::update_many()
            .col_expr(session::Column::Status, Expr::value(status.as_str()))
            .col_expr(session::Column::EndedAt, Expr::value(ended_at))
            .filter(session::Column::Id.eq(id))
            .filter(session::Column::Status.is_in(from.iter().map(|s| s.as_str())))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if closed.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Ok(false);
        }

        // An occupied PC cannot enter maintenance, so this only misses when
        // the flag was already out of sync; the session still closes.
        if !move_pc(&txn, current.pc_id, &[PcStatus::Occupied], PcStatus::Available).await? {
            warn!("PC {} was not occupied when session {} closed", current.pc_id, id);
        }

        txn.commit().await.map_err(db_err)?;
        debug!(
            "Closed session {} as {}, released PC {}",
            id, status, current.pc_id
        );
        Ok(true)
    }
}
