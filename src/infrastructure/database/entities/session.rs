//! Session entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub pc_id: i32,

    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,
    pub duration_minutes: i32,

    /// active, paused, completed, terminated
    pub status: String,

    pub payment_method: String,
    /// Cumulative amount in cents
    pub payment_amount: i64,

    #[sea_orm(nullable)]
    pub ended_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pc::Entity",
        from = "Column::PcId",
        to = "super::pc::Column::Id"
    )]
    Pc,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::pc::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pc.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
