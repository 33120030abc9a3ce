//! Shared fixtures for service tests: an in-memory venue with PCs, a few
//! customers and a small menu.

use std::sync::Arc;

use crate::domain::catalog::{ItemExtra, ItemTakeout, MenuCategory, MenuItem};
use crate::domain::customer::Customer;
use crate::domain::pc::{Pc, PcStatus};
use crate::domain::pricing::{BillingCalculator, PricingTable};
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::{memory_db, SeaOrmRepositoryProvider};
use crate::notifications::{create_event_bus, SharedEventBus};

use super::resource_pool::ResourcePool;
use super::session_manager::SessionManager;

pub struct Venue {
    pub repos: Arc<dyn RepositoryProvider>,
    pub events: SharedEventBus,
    /// PC ids in number order
    pub pcs: Vec<i32>,
    /// Customer ids
    pub customers: Vec<i32>,
    pub burger: MenuItem,
    pub cheese: ItemExtra,
    pub no_onions: ItemTakeout,
    pub cola: MenuItem,
}

pub async fn venue() -> Venue {
    let repos: Arc<dyn RepositoryProvider> =
        Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));

    let mut pcs = Vec::new();
    for number in 1..=3 {
        pcs.push(repos.pcs().save(Pc::new(number, None)).await.unwrap().id);
    }

    let mut customers = Vec::new();
    for (name, civil) in [("Sara", "290010100001"), ("Omar", "290010100002")] {
        customers.push(
            repos
                .customers()
                .save(Customer::new(name, civil, "55500000"))
                .await
                .unwrap()
                .id,
        );
    }

    let catalog = repos.catalog();
    let burger = catalog
        .save_item(MenuItem::new("Burger", MenuCategory::Food, 599))
        .await
        .unwrap();
    let cheese = catalog
        .save_extra(ItemExtra::new(burger.id, "Cheese", 100))
        .await
        .unwrap();
    let no_onions = catalog
        .save_takeout(ItemTakeout::new(burger.id, "No onions"))
        .await
        .unwrap();
    let cola = catalog
        .save_item(MenuItem::new("Cola", MenuCategory::Drink, 199))
        .await
        .unwrap();

    Venue {
        repos,
        events: create_event_bus(),
        pcs,
        customers,
        burger,
        cheese,
        no_onions,
        cola,
    }
}

impl Venue {
    /// Occupied iff a live session references the PC.
    pub async fn assert_occupancy_consistent(&self) {
        for pc in self.repos.pcs().find_all().await.unwrap() {
            let live = self.repos.sessions().find_live_for_pc(pc.id).await.unwrap();
            assert_eq!(
                pc.status == PcStatus::Occupied,
                live.is_some(),
                "PC {} occupancy out of sync",
                pc.id
            );
        }
    }

    pub fn pool(&self) -> Arc<ResourcePool> {
        Arc::new(ResourcePool::new(self.repos.clone(), self.events.clone()))
    }

    pub fn session_manager(&self) -> Arc<SessionManager> {
        let billing = BillingCalculator::new(PricingTable::default()).unwrap();
        Arc::new(SessionManager::new(
            self.repos.clone(),
            self.pool(),
            billing,
            self.events.clone(),
        ))
    }
}
