//! Order repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Order, OrderItem, OrderStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order with all its lines and selections atomically.
    async fn create(&self, order: Order) -> DomainResult<Order>;

    /// Load an order together with its lines.
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Order>>;

    /// Orders of one session, oldest first.
    async fn find_by_session(&self, session_id: i32) -> DomainResult<Vec<Order>>;

    /// Orders in any of `statuses`, oldest first.
    async fn find_by_statuses(&self, statuses: &[OrderStatus]) -> DomainResult<Vec<Order>>;

    async fn find_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Order>>;

    /// Conditionally move an order from `from` to `to`.
    /// Returns `false` when the stored status was no longer `from`.
    async fn transition(
        &self,
        id: i32,
        from: OrderStatus,
        to: OrderStatus,
        delivery_time: Option<DateTime<Utc>>,
    ) -> DomainResult<bool>;

    /// Swap the lines of a still-pending order and store its new total.
    /// Returns `false` (nothing written) when the order is no longer pending.
    async fn replace_items(
        &self,
        id: i32,
        items: Vec<OrderItem>,
        total_amount: i64,
    ) -> DomainResult<bool>;
}
