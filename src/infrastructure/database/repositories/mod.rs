//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod catalog_repository;
pub mod customer_repository;
pub mod order_repository;
pub mod pc_repository;
pub mod repository_provider;
pub mod session_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;

pub(crate) fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

pub(crate) fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn corrupt(entity: &str, field: &str, value: &str) -> DomainError {
    DomainError::Storage(format!("{} has unknown {} '{}'", entity, field, value))
}
