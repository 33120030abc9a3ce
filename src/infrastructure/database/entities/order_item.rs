//! Order line entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub order_id: i32,
    pub menu_item_id: i32,

    /// Item name at order time
    pub name: String,
    pub quantity: i32,
    /// Unit price snapshot in cents
    pub unit_price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(has_many = "super::order_item_extra::Entity")]
    Extras,
    #[sea_orm(has_many = "super::order_item_takeout::Entity")]
    Takeouts,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::order_item_extra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extras.def()
    }
}

impl Related<super::order_item_takeout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Takeouts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
