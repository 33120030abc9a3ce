//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::catalog::CatalogRepository;
use super::customer::CustomerRepository;
use super::order::OrderRepository;
use super::pc::PcRepository;
use super::session::SessionRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let pc = repos.pcs().find_by_id(3).await?;
///     let session = repos.sessions().find_live_for_pc(3).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn pcs(&self) -> &dyn PcRepository;
    fn customers(&self) -> &dyn CustomerRepository;
    fn sessions(&self) -> &dyn SessionRepository;
    fn catalog(&self) -> &dyn CatalogRepository;
    fn orders(&self) -> &dyn OrderRepository;
}
