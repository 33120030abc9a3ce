//! Catalog repository interface

use async_trait::async_trait;

use super::model::{ItemExtra, ItemTakeout, MenuItem};
use crate::domain::DomainResult;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn save_item(&self, item: MenuItem) -> DomainResult<MenuItem>;
    async fn save_extra(&self, extra: ItemExtra) -> DomainResult<ItemExtra>;
    async fn save_takeout(&self, takeout: ItemTakeout) -> DomainResult<ItemTakeout>;

    async fn find_item(&self, id: i32) -> DomainResult<Option<MenuItem>>;
    /// Available items, grouped by category then name.
    async fn find_available_items(&self) -> DomainResult<Vec<MenuItem>>;
    async fn find_extras(&self, menu_item_id: i32) -> DomainResult<Vec<ItemExtra>>;
    async fn find_takeouts(&self, menu_item_id: i32) -> DomainResult<Vec<ItemTakeout>>;

    /// Change a price. Existing orders keep their snapshots.
    async fn update_price(&self, id: i32, price: i64) -> DomainResult<()>;
    async fn set_available(&self, id: i32, available: bool) -> DomainResult<()>;
    async fn count_items(&self) -> DomainResult<u64>;
}
