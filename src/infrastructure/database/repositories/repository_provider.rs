//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::catalog::CatalogRepository;
use crate::domain::customer::CustomerRepository;
use crate::domain::order::OrderRepository;
use crate::domain::pc::PcRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::session::SessionRepository;

use super::catalog_repository::SeaOrmCatalogRepository;
use super::customer_repository::SeaOrmCustomerRepository;
use super::order_repository::SeaOrmOrderRepository;
use super::pc_repository::SeaOrmPcRepository;
use super::session_repository::SeaOrmSessionRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let pc = repos.pcs().find_by_number(7).await?;
/// let session = repos.sessions().find_live_for_pc(pc.id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    pcs: SeaOrmPcRepository,
    customers: SeaOrmCustomerRepository,
    sessions: SeaOrmSessionRepository,
    catalog: SeaOrmCatalogRepository,
    orders: SeaOrmOrderRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            pcs: SeaOrmPcRepository::new(db.clone()),
            customers: SeaOrmCustomerRepository::new(db.clone()),
            sessions: SeaOrmSessionRepository::new(db.clone()),
            catalog: SeaOrmCatalogRepository::new(db.clone()),
            orders: SeaOrmOrderRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn pcs(&self) -> &dyn PcRepository {
        &self.pcs
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn sessions(&self) -> &dyn SessionRepository {
        &self.sessions
    }

    fn catalog(&self) -> &dyn CatalogRepository {
        &self.catalog
    }

    fn orders(&self) -> &dyn OrderRepository {
        &self.orders
    }
}
