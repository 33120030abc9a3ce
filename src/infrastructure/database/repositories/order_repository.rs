//! SeaORM implementation of OrderRepository
//!
//! An order is stored across four tables (orders, lines, selected extras,
//! selected takeouts). Writes that touch more than one of them run in a
//! single transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{corrupt, db_err};
use crate::domain::order::{
    Order, OrderItem, OrderRepository, OrderStatus, SelectedExtra, SelectedTakeout,
};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{
    order, order_item, order_item_extra, order_item_takeout,
};

pub struct SeaOrmOrderRepository {
    db: DatabaseConnection,
}

impl SeaOrmOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn assemble(&self, models: Vec<order::Model>) -> DomainResult<Vec<Order>> {
        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let mut lines = load_items(&self.db, &ids).await?;
        models
            .into_iter()
            .map(|m| {
                let items = lines.remove(&m.id).unwrap_or_default();
                order_to_domain(m, items)
            })
            .collect()
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn order_to_domain(m: order::Model, items: Vec<OrderItem>) -> DomainResult<Order> {
    let status =
        OrderStatus::from_str(&m.status).ok_or_else(|| corrupt("Order", "status", &m.status))?;
    Ok(Order {
        id: m.id,
        session_id: m.session_id,
        status,
        order_time: m.order_time,
        delivery_time: m.delivery_time,
        total_amount: m.total_amount,
        items,
    })
}

/// Lines of the given orders, keyed by order id, each in insertion order.
async fn load_items<C: ConnectionTrait>(
    conn: &C,
    order_ids: &[i32],
) -> DomainResult<HashMap<i32, Vec<OrderItem>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let item_models = order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids.iter().copied()))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?;
    let item_ids: Vec<i32> = item_models.iter().map(|m| m.id).collect();

    let mut extras: HashMap<i32, Vec<SelectedExtra>> = HashMap::new();
    for e in order_item_extra::Entity::find()
        .filter(order_item_extra::Column::OrderItemId.is_in(item_ids.iter().copied()))
        .order_by_asc(order_item_extra::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?
    {
        extras.entry(e.order_item_id).or_default().push(SelectedExtra {
            extra_id: e.extra_id,
            name: e.name,
            price: e.price,
        });
    }

    let mut takeouts: HashMap<i32, Vec<SelectedTakeout>> = HashMap::new();
    for t in order_item_takeout::Entity::find()
        .filter(order_item_takeout::Column::OrderItemId.is_in(item_ids.iter().copied()))
        .order_by_asc(order_item_takeout::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?
    {
        takeouts
            .entry(t.order_item_id)
            .or_default()
            .push(SelectedTakeout {
                takeout_id: t.takeout_id,
                name: t.name,
            });
    }

    let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for m in item_models {
        by_order.entry(m.order_id).or_default().push(OrderItem {
            id: m.id,
            order_id: m.order_id,
            menu_item_id: m.menu_item_id,
            name: m.name,
            quantity: m.quantity,
            unit_price: m.unit_price,
            extras: extras.remove(&m.id).unwrap_or_default(),
            takeouts: takeouts.remove(&m.id).unwrap_or_default(),
        });
    }
    Ok(by_order)
}

/// Insert lines with their selections; returns them with assigned ids.
async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    items: Vec<OrderItem>,
) -> DomainResult<Vec<OrderItem>> {
    let mut stored = Vec::with_capacity(items.len());
    for item in items {
        let line = order_item::ActiveModel {
            id: NotSet,
            order_id: Set(order_id),
            menu_item_id: Set(item.menu_item_id),
            name: Set(item.name.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;

        for e in &item.extras {
            order_item_extra::ActiveModel {
                id: NotSet,
                order_item_id: Set(line.id),
                extra_id: Set(e.extra_id),
                name: Set(e.name.clone()),
                price: Set(e.price),
            }
            .insert(conn)
            .await
            .map_err(db_err)?;
        }

        for t in &item.takeouts {
            order_item_takeout::ActiveModel {
                id: NotSet,
                order_item_id: Set(line.id),
                takeout_id: Set(t.takeout_id),
                name: Set(t.name.clone()),
            }
            .insert(conn)
            .await
            .map_err(db_err)?;
        }

        stored.push(OrderItem {
            id: line.id,
            order_id,
            ..item
        });
    }
    Ok(stored)
}

async fn delete_items<C: ConnectionTrait>(conn: &C, order_id: i32) -> DomainResult<()> {
    let item_ids: Vec<i32> = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|m| m.id)
        .collect();

    order_item_extra::Entity::delete_many()
        .filter(order_item_extra::Column::OrderItemId.is_in(item_ids.iter().copied()))
        .exec(conn)
        .await
        .map_err(db_err)?;
    order_item_takeout::Entity::delete_many()
        .filter(order_item_takeout::Column::OrderItemId.is_in(item_ids.iter().copied()))
        .exec(conn)
        .await
        .map_err(db_err)?;
    order_item::Entity::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

// ── OrderRepository impl ────────────────────────────────────────

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn create(&self, o: Order) -> DomainResult<Order> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let header = order::ActiveModel {
            id: NotSet,
            session_id: Set(o.session_id),
            status: Set(o.status.as_str().to_string()),
            order_time: Set(o.order_time),
            delivery_time: Set(o.delivery_time),
            total_amount: Set(o.total_amount),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let items = insert_items(&txn, header.id, o.items).await?;
        txn.commit().await.map_err(db_err)?;

        debug!(
            "Created order {} for session {} ({} line(s))",
            header.id,
            header.session_id,
            items.len()
        );
        order_to_domain(header, items)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Order>> {
        let Some(model) = order::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        Ok(self.assemble(vec![model]).await?.pop())
    }

    async fn find_by_session(&self, session_id: i32) -> DomainResult<Vec<Order>> {
        let models = order::Entity::find()
            .filter(order::Column::SessionId.eq(session_id))
            .order_by_asc(order::Column::OrderTime)
            .order_by_asc(order::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.assemble(models).await
    }

    async fn find_by_statuses(&self, statuses: &[OrderStatus]) -> DomainResult<Vec<Order>> {
        let models = order::Entity::find()
            .filter(order::Column::Status.is_in(statuses.iter().map(|s| s.as_str())))
            .order_by_asc(order::Column::OrderTime)
            .order_by_asc(order::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.assemble(models).await
    }

    async fn find_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Order>> {
        let models = order::Entity::find()
            .filter(order::Column::OrderTime.gte(since))
            .order_by_asc(order::Column::OrderTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.assemble(models).await
    }

    async fn transition(
        &self,
        id: i32,
        from: OrderStatus,
        to: OrderStatus,
        delivery_time: Option<DateTime<Utc>>,
    ) -> DomainResult<bool> {
        let mut update = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.as_str()))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(from.as_str()));
        if let Some(at) = delivery_time {
            update = update.col_expr(order::Column::DeliveryTime, Expr::value(at));
        }
        let result = update.exec(&self.db).await.map_err(db_err)?;

        debug!(
            "Order {} {} -> {}: {} row(s)",
            id, from, to, result.rows_affected
        );
        Ok(result.rows_affected == 1)
    }

    async fn replace_items(
        &self,
        id: i32,
        items: Vec<OrderItem>,
        total_amount: i64,
    ) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let guarded = order::Entity::update_many()
            .col_expr(order::Column::TotalAmount, Expr::value(total_amount))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if guarded.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Ok(false);
        }

        delete_items(&txn, id).await?;
        insert_items(&txn, id, items).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogRepository, MenuCategory, MenuItem};
    use crate::domain::customer::{Customer, CustomerRepository};
    use crate::domain::pc::{Pc, PcRepository};
    use crate::domain::session::{PaymentMethod, Session, SessionRepository};
    use crate::infrastructure::database::memory_db;
    use crate::infrastructure::database::repositories::{
        catalog_repository::SeaOrmCatalogRepository, customer_repository::SeaOrmCustomerRepository,
        pc_repository::SeaOrmPcRepository, session_repository::SeaOrmSessionRepository,
    };

    async fn fixture() -> (SeaOrmOrderRepository, i32, i32) {
        let db = memory_db().await;
        let pc = SeaOrmPcRepository::new(db.clone())
            .save(Pc::new(1, None))
            .await
            .unwrap();
        let user = SeaOrmCustomerRepository::new(db.clone())
            .save(Customer::new("Ali", "1", "5"))
            .await
            .unwrap();
        let session = SeaOrmSessionRepository::new(db.clone())
            .open(Session::new(user.id, pc.id, 60, PaymentMethod::Cash, 500, Utc::now()))
            .await
            .unwrap();
        let item = SeaOrmCatalogRepository::new(db.clone())
            .save_item(MenuItem::new("Pizza", MenuCategory::Food, 899))
            .await
            .unwrap();
        (SeaOrmOrderRepository::new(db), session.id, item.id)
    }

    fn line(menu_item_id: i32, quantity: i32, unit_price: i64) -> OrderItem {
        OrderItem {
            id: 0,
            order_id: 0,
            menu_item_id,
            name: "Pizza".into(),
            quantity,
            unit_price,
            extras: vec![SelectedExtra {
                extra_id: 7,
                name: "Olives".into(),
                price: 50,
            }],
            takeouts: vec![SelectedTakeout {
                takeout_id: 9,
                name: "No onions".into(),
            }],
        }
    }

    #[tokio::test]
    async fn create_and_reload_with_selections() {
        let (repo, session_id, item_id) = fixture().await;
        let created = repo
            .create(Order::new(session_id, vec![line(item_id, 2, 899)], Utc::now()).unwrap())
            .await
            .unwrap();
        assert_eq!(created.total_amount, (899 + 50) * 2);

        let loaded = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].extras[0].name, "Olives");
        assert_eq!(loaded.items[0].takeouts[0].takeout_id, 9);
        assert_eq!(loaded.total_amount, created.total_amount);
    }

    #[tokio::test]
    async fn transition_is_conditional_on_current_status() {
        let (repo, session_id, item_id) = fixture().await;
        let o = repo
            .create(Order::new(session_id, vec![line(item_id, 1, 899)], Utc::now()).unwrap())
            .await
            .unwrap();

        assert!(repo
            .transition(o.id, OrderStatus::Pending, OrderStatus::Preparing, None)
            .await
            .unwrap());
        assert!(!repo
            .transition(o.id, OrderStatus::Pending, OrderStatus::Cancelled, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn replace_items_only_while_pending() {
        let (repo, session_id, item_id) = fixture().await;
        let o = repo
            .create(Order::new(session_id, vec![line(item_id, 1, 899)], Utc::now()).unwrap())
            .await
            .unwrap();

        assert!(repo
            .replace_items(o.id, vec![line(item_id, 3, 899)], 2847)
            .await
            .unwrap());
        let loaded = repo.find_by_id(o.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].quantity, 3);
        assert_eq!(loaded.total_amount, 2847);

        repo.transition(o.id, OrderStatus::Pending, OrderStatus::Preparing, None)
            .await
            .unwrap();
        assert!(!repo
            .replace_items(o.id, vec![line(item_id, 1, 899)], 949)
            .await
            .unwrap());
        let loaded = repo.find_by_id(o.id).await.unwrap().unwrap();
        assert_eq!(loaded.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn open_queue_is_oldest_first() {
        let (repo, session_id, item_id) = fixture().await;
        let now = Utc::now();
        let later = repo
            .create(Order::new(session_id, vec![line(item_id, 1, 899)], now).unwrap())
            .await
            .unwrap();
        let earlier = repo
            .create(Order::new(
                session_id,
                vec![line(item_id, 1, 899)],
                now - chrono::Duration::minutes(5),
            )
            .unwrap())
            .await
            .unwrap();

        let queue = repo.find_by_statuses(&OrderStatus::OPEN).await.unwrap();
        assert_eq!(
            queue.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![earlier.id, later.id]
        );
    }
}
