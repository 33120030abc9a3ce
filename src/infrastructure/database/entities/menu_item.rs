//! Menu item entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// food, drink, accessory, service
    pub category: String,

    /// Unit price in cents
    pub price: i64,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    pub available: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_extra::Entity")]
    Extras,
    #[sea_orm(has_many = "super::item_takeout::Entity")]
    Takeouts,
}

impl Related<super::item_extra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extras.def()
    }
}

impl Related<super::item_takeout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Takeouts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
