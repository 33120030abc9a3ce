//! Order workflow: pricing, placement and fulfilment of desk orders
//!
//! Prices are snapshotted from the catalog when an order is placed (or its
//! lines replaced); later catalog edits never touch existing orders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::catalog::{ItemExtra, ItemTakeout, MenuItem};
use crate::domain::order::{
    Order, OrderItem, OrderItemRequest, OrderStatus, SelectedExtra, SelectedTakeout,
};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::notifications::{Event, OrderPlacedEvent, OrderStatusChangedEvent, SharedEventBus};
use crate::shared::errors::DomainError;
use crate::shared::retry::{retry_with_backoff, RetryConfig};

/// A menu item together with the options a customer may pick for it
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub item: MenuItem,
    pub extras: Vec<ItemExtra>,
    pub takeouts: Vec<ItemTakeout>,
}

pub struct OrderWorkflow {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    retry: RetryConfig,
}

impl OrderWorkflow {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus) -> Self {
        Self {
            repos,
            events,
            retry: RetryConfig::default(),
        }
    }

    /// Orderable items with their extras and takeouts.
    pub async fn menu(&self) -> DomainResult<Vec<MenuEntry>> {
        let catalog = self.repos.catalog();
        let mut entries = Vec::new();
        for item in catalog.find_available_items().await? {
            let extras = catalog.find_extras(item.id).await?;
            let takeouts = catalog.find_takeouts(item.id).await?;
            entries.push(MenuEntry {
                item,
                extras,
                takeouts,
            });
        }
        Ok(entries)
    }

    /// Staff edit of a menu item's price or availability. Placed orders keep
    /// the prices they were snapshotted with.
    pub async fn update_menu_item(
        &self,
        item_id: i32,
        price: Option<i64>,
        available: Option<bool>,
    ) -> DomainResult<MenuItem> {
        if let Some(price) = price {
            if price < 0 {
                return Err(DomainError::Validation(
                    "Menu price must not be negative".to_string(),
                ));
            }
        }

        let catalog = self.repos.catalog();
        if let Some(price) = price {
            catalog.update_price(item_id, price).await?;
        }
        if let Some(available) = available {
            catalog.set_available(item_id, available).await?;
        }

        let item = catalog
            .find_item(item_id)
            .await?
            .ok_or_else(|| DomainError::not_found("MenuItem", item_id))?;
        info!(
            menu_item_id = item.id,
            price = item.price,
            available = item.available,
            "Menu item updated"
        );
        Ok(item)
    }

    pub async fn get(&self, order_id: i32) -> DomainResult<Order> {
        self.repos
            .orders()
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))
    }

    /// Staff fulfilment queue: open orders, oldest first.
    pub async fn pending_orders(&self) -> DomainResult<Vec<Order>> {
        self.repos.orders().find_by_statuses(&OrderStatus::OPEN).await
    }

    pub async fn orders_for_session(&self, session_id: i32) -> DomainResult<Vec<Order>> {
        if self.repos.sessions().find_by_id(session_id).await?.is_none() {
            return Err(DomainError::not_found("Session", session_id));
        }
        self.repos.orders().find_by_session(session_id).await
    }

    pub async fn create(
        &self,
        session_id: i32,
        items: Vec<OrderItemRequest>,
    ) -> DomainResult<Order> {
        self.create_at(session_id, items, Utc::now()).await
    }

    /// Price every line against the current catalog and store the order with
    /// its lines in one transaction.
    pub async fn create_at(
        &self,
        session_id: i32,
        items: Vec<OrderItemRequest>,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let session = self
            .repos
            .sessions()
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Session", session_id))?;
        if session.is_terminal() {
            return Err(DomainError::invalid_transition(
                "Session",
                session_id,
                session.status,
                "place an order for",
            ));
        }

        let lines = self.price_lines(&items).await?;
        let order = self
            .repos
            .orders()
            .create(Order::new(session_id, lines, now)?)
            .await?;

        metrics::counter!("lounge_orders_created_total").increment(1);
        info!(
            order_id = order.id,
            session_id,
            pc_id = session.pc_id,
            lines = order.items.len(),
            total = order.total_amount,
            "Order placed"
        );

        self.events.publish(Event::OrderPlaced(OrderPlacedEvent {
            order_id: order.id,
            session_id,
            total_amount: order.total_amount,
            timestamp: now,
        }));

        Ok(order)
    }

    pub async fn advance(&self, order_id: i32, target: OrderStatus) -> DomainResult<Order> {
        self.advance_at(order_id, target, Utc::now()).await
    }

    /// Move an order one step along the fulfilment chain. `cancelled` is
    /// accepted and behaves like [`OrderWorkflow::cancel`].
    pub async fn advance_at(
        &self,
        order_id: i32,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        self.transition(order_id, "order_advance", move |order| {
            order.advance(target, now)
        })
        .await
    }

    /// Cancel from any open state. Cancelling a cancelled order is a no-op.
    pub async fn cancel(&self, order_id: i32) -> DomainResult<Order> {
        self.transition(order_id, "order_cancel", Order::cancel).await
    }

    /// Customer-initiated cancel: only for the customer's own session and
    /// only before the kitchen starts on it.
    pub async fn cancel_for_session(&self, order_id: i32, session_id: i32) -> DomainResult<Order> {
        let order = self.get(order_id).await?;
        if order.session_id != session_id {
            return Err(DomainError::NotFound {
                entity: "Order",
                field: "session_id",
                value: session_id.to_string(),
            });
        }
        match order.status {
            OrderStatus::Pending | OrderStatus::Cancelled => {}
            other => {
                return Err(DomainError::invalid_transition(
                    "Order", order_id, other, "cancel",
                ))
            }
        }

        self.transition(order_id, "order_cancel", |order| {
            if order.status != OrderStatus::Pending && order.status != OrderStatus::Cancelled {
                return Err(DomainError::invalid_transition(
                    "Order",
                    order.id,
                    order.status,
                    "cancel",
                ));
            }
            order.cancel()
        })
        .await
    }

    /// Swap the lines of a pending order, re-pricing them against the
    /// current catalog.
    pub async fn replace_items(
        &self,
        order_id: i32,
        items: Vec<OrderItemRequest>,
    ) -> DomainResult<Order> {
        let order = self.get(order_id).await?;
        order.ensure_editable()?;

        let lines = self.price_lines(&items).await?;
        let total = Order::total_of(&lines)?;
        if !self
            .repos
            .orders()
            .replace_items(order_id, lines, total)
            .await?
        {
            // Picked up by the kitchen in between
            let current = self.get(order_id).await?;
            return Err(DomainError::invalid_transition(
                "Order",
                order_id,
                current.status,
                "edit items of",
            ));
        }

        info!(order_id, session_id = order.session_id, total, "Order items replaced");
        self.get(order_id).await
    }

    /// Load, apply `apply`, and write the new status conditionally on the
    /// old one. A lost race is retried against fresh state.
    async fn transition<F>(&self, order_id: i32, op: &'static str, apply: F) -> DomainResult<Order>
    where
        F: Fn(&mut Order) -> Result<bool, DomainError>,
    {
        let apply = &apply;
        let (order, changed) = retry_with_backoff(
            &self.retry,
            || async move {
                let mut order = self.get(order_id).await?;
                let from = order.status;
                if !apply(&mut order)? {
                    return Ok((order, false));
                }
                if !self
                    .repos
                    .orders()
                    .transition(order_id, from, order.status, order.delivery_time)
                    .await?
                {
                    return Err(DomainError::Conflict(format!(
                        "Concurrent update of order {}",
                        order_id
                    )));
                }
                Ok((order, true))
            },
            DomainError::is_transient,
            op,
        )
        .await?;

        if changed {
            metrics::counter!("lounge_order_transitions_total", "status" => order.status.as_str())
                .increment(1);
            info!(
                order_id,
                session_id = order.session_id,
                status = %order.status,
                "Order status changed"
            );
            self.events
                .publish(Event::OrderStatusChanged(OrderStatusChangedEvent {
                    order_id,
                    session_id: order.session_id,
                    status: order.status.to_string(),
                    timestamp: Utc::now(),
                }));
        }
        Ok(order)
    }

    /// Resolve requests into priced lines. Fails on the first line that
    /// references something unknown or disabled.
    async fn price_lines(&self, requests: &[OrderItemRequest]) -> DomainResult<Vec<OrderItem>> {
        if requests.is_empty() {
            return Err(DomainError::Validation(
                "Order must contain at least one item".into(),
            ));
        }

        let catalog = self.repos.catalog();
        let mut lines = Vec::with_capacity(requests.len());
        for req in requests {
            if req.quantity <= 0 {
                return Err(DomainError::Validation(format!(
                    "Quantity must be positive, got {}",
                    req.quantity
                )));
            }

            let item = match catalog.find_item(req.menu_item_id).await? {
                Some(item) if item.available => item,
                _ => return Err(DomainError::ItemUnavailable(req.menu_item_id)),
            };

            let offered = catalog.find_extras(item.id).await?;
            let mut extras: Vec<SelectedExtra> = Vec::new();
            for id in &req.extra_ids {
                if extras.iter().any(|e| e.extra_id == *id) {
                    continue;
                }
                let extra = offered
                    .iter()
                    .find(|e| e.id == *id)
                    .ok_or(DomainError::ItemUnavailable(item.id))?;
                extras.push(SelectedExtra {
                    extra_id: extra.id,
                    name: extra.name.clone(),
                    price: extra.price,
                });
            }

            let offered = catalog.find_takeouts(item.id).await?;
            let mut takeouts: Vec<SelectedTakeout> = Vec::new();
            for id in &req.takeout_ids {
                if takeouts.iter().any(|t| t.takeout_id == *id) {
                    continue;
                }
                let takeout = offered
                    .iter()
                    .find(|t| t.id == *id)
                    .ok_or(DomainError::ItemUnavailable(item.id))?;
                takeouts.push(SelectedTakeout {
                    takeout_id: takeout.id,
                    name: takeout.name.clone(),
                });
            }

            lines.push(OrderItem {
                id: 0,
                order_id: 0,
                menu_item_id: item.id,
                name: item.name,
                quantity: req.quantity,
                unit_price: item.price,
                extras,
                takeouts,
            });
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::application::services::test_support::{venue, Venue};
    use crate::domain::session::PaymentMethod;

    async fn open_session(v: &Venue) -> i32 {
        v.session_manager()
            .start(v.customers[0], v.pcs[0], 60, PaymentMethod::Cash)
            .await
            .unwrap()
            .id
    }

    fn workflow(v: &Venue) -> OrderWorkflow {
        OrderWorkflow::new(v.repos.clone(), v.events.clone())
    }

    #[tokio::test]
    async fn total_counts_extra_per_unit_and_ignores_takeout() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);

        let order = orders
            .create(
                session_id,
                vec![
                    OrderItemRequest::new(v.burger.id, 2)
                        .with_extras([v.cheese.id])
                        .with_takeouts([v.no_onions.id]),
                    OrderItemRequest::new(v.cola.id, 1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, (599 + 100) * 2 + 199);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].extras[0].name, "Cheese");
        assert_eq!(order.items[0].takeouts[0].name, "No onions");
    }

    #[tokio::test]
    async fn later_price_changes_do_not_touch_existing_orders() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);

        let order = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 3)])
            .await
            .unwrap();
        orders
            .update_menu_item(v.cola.id, Some(999), None)
            .await
            .unwrap();

        let reloaded = orders.get(order.id).await.unwrap();
        assert_eq!(reloaded.total_amount, 597);
        assert_eq!(reloaded.items[0].unit_price, 199);
    }

    #[tokio::test]
    async fn create_rejects_bad_lines_without_writing() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);

        assert!(matches!(
            orders.create(session_id, vec![]).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            orders
                .create(session_id, vec![OrderItemRequest::new(v.cola.id, 0)])
                .await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            orders
                .create(session_id, vec![OrderItemRequest::new(9999, 1)])
                .await
                .unwrap_err(),
            DomainError::ItemUnavailable(9999)
        );

        // Extra offered for a different item
        assert_eq!(
            orders
                .create(
                    session_id,
                    vec![OrderItemRequest::new(v.cola.id, 1).with_extras([v.cheese.id])]
                )
                .await
                .unwrap_err(),
            DomainError::ItemUnavailable(v.cola.id)
        );

        orders
            .update_menu_item(v.burger.id, None, Some(false))
            .await
            .unwrap();
        assert_eq!(
            orders
                .create(
                    session_id,
                    vec![
                        OrderItemRequest::new(v.cola.id, 1),
                        OrderItemRequest::new(v.burger.id, 1),
                    ]
                )
                .await
                .unwrap_err(),
            DomainError::ItemUnavailable(v.burger.id)
        );

        assert!(orders.orders_for_session(session_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_requires_live_session() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);

        assert!(matches!(
            orders
                .create(4242, vec![OrderItemRequest::new(v.cola.id, 1)])
                .await,
            Err(DomainError::NotFound { .. })
        ));

        v.session_manager().terminate(session_id).await.unwrap();
        assert!(matches!(
            orders
                .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
                .await,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn advance_walks_the_chain_and_stamps_delivery() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let order = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();

        assert!(matches!(
            orders.advance(order.id, OrderStatus::Ready).await,
            Err(DomainError::InvalidTransition { .. })
        ));

        orders.advance(order.id, OrderStatus::Preparing).await.unwrap();
        orders.advance(order.id, OrderStatus::Ready).await.unwrap();
        let now = Utc::now();
        let delivered = orders
            .advance_at(order.id, OrderStatus::Delivered, now)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.delivery_time, Some(now));
        assert_eq!(orders.get(order.id).await.unwrap(), delivered);

        assert!(matches!(
            orders.cancel(order.id).await,
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn advance_on_cancelled_order_changes_nothing() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let order = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();

        let cancelled = orders.cancel(order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = orders
            .advance(order.id, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(orders.get(order.id).await.unwrap(), cancelled);

        // Second cancel is a silent no-op
        assert_eq!(orders.cancel(order.id).await.unwrap(), cancelled);
        assert_eq!(
            orders
                .advance(order.id, OrderStatus::Cancelled)
                .await
                .unwrap(),
            cancelled
        );
    }

    #[tokio::test]
    async fn concurrent_advances_apply_once() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let order = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            orders.advance(order.id, OrderStatus::Preparing),
            orders.advance(order.id, OrderStatus::Preparing),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(
            orders.get(order.id).await.unwrap().status,
            OrderStatus::Preparing
        );
    }

    #[tokio::test]
    async fn pending_queue_is_oldest_first_and_excludes_closed() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let now = Utc::now();

        let late = orders
            .create_at(session_id, vec![OrderItemRequest::new(v.cola.id, 1)], now)
            .await
            .unwrap();
        let early = orders
            .create_at(
                session_id,
                vec![OrderItemRequest::new(v.burger.id, 1)],
                now - Duration::minutes(5),
            )
            .await
            .unwrap();
        let gone = orders
            .create_at(
                session_id,
                vec![OrderItemRequest::new(v.cola.id, 2)],
                now - Duration::minutes(10),
            )
            .await
            .unwrap();
        orders.cancel(gone.id).await.unwrap();

        let queue: Vec<i32> = orders
            .pending_orders()
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(queue, vec![early.id, late.id]);
        assert_eq!(orders.orders_for_session(session_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn customer_cancel_only_own_pending_orders() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let a = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();
        let b = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();

        assert!(matches!(
            orders.cancel_for_session(a.id, session_id + 1).await,
            Err(DomainError::NotFound { .. })
        ));

        orders.advance(b.id, OrderStatus::Preparing).await.unwrap();
        assert!(matches!(
            orders.cancel_for_session(b.id, session_id).await,
            Err(DomainError::InvalidTransition { .. })
        ));

        let cancelled = orders.cancel_for_session(a.id, session_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            orders.cancel_for_session(a.id, session_id).await.unwrap(),
            cancelled
        );
    }

    #[tokio::test]
    async fn replace_items_reprices_only_while_pending() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let order = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();

        let edited = orders
            .replace_items(
                order.id,
                vec![OrderItemRequest::new(v.burger.id, 1).with_extras([v.cheese.id])],
            )
            .await
            .unwrap();
        assert_eq!(edited.total_amount, 699);
        assert_eq!(edited.items.len(), 1);
        assert_eq!(edited.items[0].menu_item_id, v.burger.id);

        orders.advance(order.id, OrderStatus::Preparing).await.unwrap();
        assert!(matches!(
            orders
                .replace_items(order.id, vec![OrderItemRequest::new(v.cola.id, 5)])
                .await,
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(orders.get(order.id).await.unwrap().total_amount, 699);
    }

    #[tokio::test]
    async fn placing_an_order_publishes_event() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        let mut sub = v.events.subscribe();

        let order = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 1)])
            .await
            .unwrap();

        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.event_type(), "order_placed");
        assert_eq!(msg.event.session_id(), Some(session_id));
        match msg.event {
            Event::OrderPlaced(e) => assert_eq!(e.order_id, order.id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn menu_lists_options_per_item() {
        let v = venue().await;
        let menu = workflow(&v).menu().await.unwrap();
        let burger = menu.iter().find(|e| e.item.id == v.burger.id).unwrap();
        assert_eq!(burger.extras, vec![v.cheese.clone()]);
        assert_eq!(burger.takeouts, vec![v.no_onions.clone()]);
        let cola = menu.iter().find(|e| e.item.id == v.cola.id).unwrap();
        assert!(cola.extras.is_empty());
    }

    #[tokio::test]
    async fn disabled_items_leave_the_menu() {
        let v = venue().await;
        let orders = workflow(&v);

        let hidden = orders
            .update_menu_item(v.cola.id, Some(249), Some(false))
            .await
            .unwrap();
        assert_eq!(hidden.price, 249);
        assert!(!hidden.available);
        let menu = orders.menu().await.unwrap();
        assert!(menu.iter().all(|e| e.item.id != v.cola.id));

        orders
            .update_menu_item(v.cola.id, None, Some(true))
            .await
            .unwrap();
        assert!(orders
            .menu()
            .await
            .unwrap()
            .iter()
            .any(|e| e.item.id == v.cola.id));
    }

    #[tokio::test]
    async fn menu_edits_are_validated() {
        let v = venue().await;
        let orders = workflow(&v);
        assert!(matches!(
            orders.update_menu_item(v.cola.id, Some(-1), None).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            orders.update_menu_item(9999, Some(100), None).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            orders.update_menu_item(9999, None, None).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn order_total_overflow_is_rejected() {
        let v = venue().await;
        let session_id = open_session(&v).await;
        let orders = workflow(&v);
        orders
            .update_menu_item(v.cola.id, Some(i64::MAX / 2), None)
            .await
            .unwrap();

        let err = orders
            .create(session_id, vec![OrderItemRequest::new(v.cola.id, 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(orders.orders_for_session(session_id).await.unwrap().is_empty());
    }
}
