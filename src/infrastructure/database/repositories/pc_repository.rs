//! SeaORM implementation of PcRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::{corrupt, db_err, is_unique_violation};
use crate::domain::pc::{Pc, PcRepository, PcStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::pc;

pub struct SeaOrmPcRepository {
    db: DatabaseConnection,
}

impl SeaOrmPcRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn model_to_domain(m: pc::Model) -> DomainResult<Pc> {
    let status =
        PcStatus::from_str(&m.status).ok_or_else(|| corrupt("PC", "status", &m.status))?;
    Ok(Pc {
        id: m.id,
        number: m.number,
        status,
        specs: m.specs,
        created_at: m.created_at,
    })
}

fn models_to_domain(models: Vec<pc::Model>) -> DomainResult<Vec<Pc>> {
    models.into_iter().map(model_to_domain).collect()
}

/// Move a PC from one of `from` to `to` on `conn`, which may be an open
/// transaction. Every PC status write goes through here.
pub(crate) async fn move_pc<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    from: &[PcStatus],
    to: PcStatus,
) -> DomainResult<bool> {
    let result = pc::Entity::update_many()
        .col_expr(pc::Column::Status, Expr::value(to.as_str()))
        .filter(pc::Column::Id.eq(id))
        .filter(pc::Column::Status.is_in(from.iter().map(|s| s.as_str())))
        .exec(conn)
        .await
        .map_err(db_err)?;

    debug!("PC {} -> {}: {} row(s)", id, to, result.rows_affected);
    Ok(result.rows_affected == 1)
}

// ── PcRepository impl ───────────────────────────────────────────

#[async_trait]
impl PcRepository for SeaOrmPcRepository {
    async fn save(&self, p: Pc) -> DomainResult<Pc> {
        debug!("Saving PC #{}", p.number);

        let model = pc::ActiveModel {
            id: NotSet,
            number: Set(p.number),
            status: Set(p.status.as_str().to_string()),
            specs: Set(p.specs),
            created_at: Set(p.created_at),
        };
        let inserted = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::Conflict(format!("PC number {} is already registered", p.number))
            } else {
                db_err(e)
            }
        })?;
        model_to_domain(inserted)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Pc>> {
        let model = pc::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_number(&self, number: i32) -> DomainResult<Option<Pc>> {
        let model = pc::Entity::find()
            .filter(pc::Column::Number.eq(number))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<Pc>> {
        let models = pc::Entity::find()
            .order_by_asc(pc::Column::Number)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_by_status(&self, status: PcStatus) -> DomainResult<Vec<Pc>> {
        let models = pc::Entity::find()
            .filter(pc::Column::Status.eq(status.as_str()))
            .order_by_asc(pc::Column::Number)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn transition(&self, id: i32, from: &[PcStatus], to: PcStatus) -> DomainResult<bool> {
        move_pc(&self.db, id, from, to).await
    }

    async fn count(&self) -> DomainResult<u64> {
        pc::Entity::find().count(&self.db).await.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::memory_db;

    #[tokio::test]
    async fn save_and_list_ordered_by_number() {
        let repo = SeaOrmPcRepository::new(memory_db().await);
        repo.save(Pc::new(2, None)).await.unwrap();
        repo.save(Pc::new(1, Some("RTX 3080".into()))).await.unwrap();

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_number_is_a_conflict() {
        let repo = SeaOrmPcRepository::new(memory_db().await);
        repo.save(Pc::new(1, None)).await.unwrap();
        let err = repo.save(Pc::new(1, None)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn transition_is_conditional() {
        let repo = SeaOrmPcRepository::new(memory_db().await);
        let pc = repo.save(Pc::new(1, None)).await.unwrap();

        assert!(repo
            .transition(pc.id, &[PcStatus::Available], PcStatus::Occupied)
            .await
            .unwrap());
        assert!(!repo
            .transition(pc.id, &[PcStatus::Available], PcStatus::Occupied)
            .await
            .unwrap());

        let stored = repo.find_by_id(pc.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PcStatus::Occupied);
    }

    #[tokio::test]
    async fn transition_of_unknown_pc_changes_nothing() {
        let repo = SeaOrmPcRepository::new(memory_db().await);
        assert!(!repo
            .transition(99, &[PcStatus::Available], PcStatus::Maintenance)
            .await
            .unwrap());
    }
}
