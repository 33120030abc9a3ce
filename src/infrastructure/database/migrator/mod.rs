//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_pcs;
mod m20240101_000002_create_users;
mod m20240101_000003_create_sessions;
mod m20240101_000004_create_menu;
mod m20240101_000005_create_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_pcs::Migration),
            Box::new(m20240101_000002_create_users::Migration),
            Box::new(m20240101_000003_create_sessions::Migration),
            Box::new(m20240101_000004_create_menu::Migration),
            Box::new(m20240101_000005_create_orders::Migration),
        ]
    }
}
