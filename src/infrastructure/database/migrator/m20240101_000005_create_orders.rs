//! Create orders tables
//!
//! Order lines and their selections carry name/price snapshots so catalog
//! changes never re-price an existing order.

use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_sessions::Sessions;
use super::m20240101_000004_create_menu::MenuItems;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::SessionId).integer().not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Orders::OrderTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::DeliveryTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_session")
                            .from(Orders::Table, Orders::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_session")
                    .table(Orders::Table)
                    .col(Orders::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
                    .col(ColumnDef::new(OrderItems::MenuItemId).integer().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string().not_null())
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(OrderItems::UnitPrice).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_menu_item")
                            .from(OrderItems::Table, OrderItems::MenuItemId)
                            .to(MenuItems::Table, MenuItems::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItemExtras::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItemExtras::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderItemExtras::OrderItemId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItemExtras::ExtraId).integer().not_null())
                    .col(ColumnDef::new(OrderItemExtras::Name).string().not_null())
                    .col(
                        ColumnDef::new(OrderItemExtras::Price)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_extras_item")
                            .from(OrderItemExtras::Table, OrderItemExtras::OrderItemId)
                            .to(OrderItems::Table, OrderItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItemTakeouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItemTakeouts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OrderItemTakeouts::OrderItemId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItemTakeouts::TakeoutId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrderItemTakeouts::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_takeouts_item")
                            .from(OrderItemTakeouts::Table, OrderItemTakeouts::OrderItemId)
                            .to(OrderItems::Table, OrderItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItemTakeouts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItemExtras::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Orders {
    Table,
    Id,
    SessionId,
    Status,
    OrderTime,
    DeliveryTime,
    TotalAmount,
}

#[derive(Iden)]
pub enum OrderItems {
    Table,
    Id,
    OrderId,
    MenuItemId,
    Name,
    Quantity,
    UnitPrice,
}

#[derive(Iden)]
pub enum OrderItemExtras {
    Table,
    Id,
    OrderItemId,
    ExtraId,
    Name,
    Price,
}

#[derive(Iden)]
pub enum OrderItemTakeouts {
    Table,
    Id,
    OrderItemId,
    TakeoutId,
    Name,
}
