//! SeaORM implementation of CatalogRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::{corrupt, db_err};
use crate::domain::catalog::{CatalogRepository, ItemExtra, ItemTakeout, MenuCategory, MenuItem};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{item_extra, item_takeout, menu_item};

pub struct SeaOrmCatalogRepository {
    db: DatabaseConnection,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn update_item(&self, id: i32, col: menu_item::Column, value: SimpleExpr) -> DomainResult<()> {
        let result = menu_item::Entity::update_many()
            .col_expr(col, value)
            .filter(menu_item::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("MenuItem", id));
        }
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn item_to_domain(m: menu_item::Model) -> DomainResult<MenuItem> {
    let category = MenuCategory::from_str(&m.category)
        .ok_or_else(|| corrupt("MenuItem", "category", &m.category))?;
    Ok(MenuItem {
        id: m.id,
        name: m.name,
        category,
        price: m.price,
        description: m.description,
        available: m.available,
        created_at: m.created_at,
    })
}

fn extra_to_domain(m: item_extra::Model) -> ItemExtra {
    ItemExtra {
        id: m.id,
        menu_item_id: m.menu_item_id,
        name: m.name,
        price: m.price,
    }
}

fn takeout_to_domain(m: item_takeout::Model) -> ItemTakeout {
    ItemTakeout {
        id: m.id,
        menu_item_id: m.menu_item_id,
        name: m.name,
    }
}

// ── CatalogRepository impl ──────────────────────────────────────

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn save_item(&self, item: MenuItem) -> DomainResult<MenuItem> {
        debug!("Saving menu item: {}", item.name);

        let model = menu_item::ActiveModel {
            id: NotSet,
            name: Set(item.name),
            category: Set(item.category.as_str().to_string()),
            price: Set(item.price),
            description: Set(item.description),
            available: Set(item.available),
            created_at: Set(item.created_at),
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        item_to_domain(inserted)
    }

    async fn save_extra(&self, extra: ItemExtra) -> DomainResult<ItemExtra> {
        let model = item_extra::ActiveModel {
            id: NotSet,
            menu_item_id: Set(extra.menu_item_id),
            name: Set(extra.name),
            price: Set(extra.price),
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(extra_to_domain(inserted))
    }

    async fn save_takeout(&self, takeout: ItemTakeout) -> DomainResult<ItemTakeout> {
        let model = item_takeout::ActiveModel {
            id: NotSet,
            menu_item_id: Set(takeout.menu_item_id),
            name: Set(takeout.name),
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        Ok(takeout_to_domain(inserted))
    }

    async fn find_item(&self, id: i32) -> DomainResult<Option<MenuItem>> {
        let model = menu_item::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(item_to_domain).transpose()
    }

    async fn find_available_items(&self) -> DomainResult<Vec<MenuItem>> {
        let models = menu_item::Entity::find()
            .filter(menu_item::Column::Available.eq(true))
            .order_by_asc(menu_item::Column::Category)
            .order_by_asc(menu_item::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(item_to_domain).collect()
    }

    async fn find_extras(&self, menu_item_id: i32) -> DomainResult<Vec<ItemExtra>> {
        let models = item_extra::Entity::find()
            .filter(item_extra::Column::MenuItemId.eq(menu_item_id))
            .order_by_asc(item_extra::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(extra_to_domain).collect())
    }

    async fn find_takeouts(&self, menu_item_id: i32) -> DomainResult<Vec<ItemTakeout>> {
        let models = item_takeout::Entity::find()
            .filter(item_takeout::Column::MenuItemId.eq(menu_item_id))
            .order_by_asc(item_takeout::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(takeout_to_domain).collect())
    }

    async fn update_price(&self, id: i32, price: i64) -> DomainResult<()> {
        self.update_item(id, menu_item::Column::Price, Expr::value(price))
            .await
    }

    async fn set_available(&self, id: i32, available: bool) -> DomainResult<()> {
        self.update_item(id, menu_item::Column::Available, Expr::value(available))
            .await
    }

    async fn count_items(&self) -> DomainResult<u64> {
        menu_item::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
