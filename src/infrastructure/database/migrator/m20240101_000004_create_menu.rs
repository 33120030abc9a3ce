//! Create menu tables: items, their priced extras and free takeouts

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MenuItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MenuItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MenuItems::Name).string().not_null())
                    .col(ColumnDef::new(MenuItems::Category).string().not_null())
                    .col(ColumnDef::new(MenuItems::Price).big_integer().not_null())
                    .col(ColumnDef::new(MenuItems::Description).string())
                    .col(
                        ColumnDef::new(MenuItems::Available)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(MenuItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItemExtras::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemExtras::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemExtras::MenuItemId).integer().not_null())
                    .col(ColumnDef::new(ItemExtras::Name).string().not_null())
                    .col(
                        ColumnDef::new(ItemExtras::Price)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_extras_menu_item")
                            .from(ItemExtras::Table, ItemExtras::MenuItemId)
                            .to(MenuItems::Table, MenuItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItemTakeouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemTakeouts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemTakeouts::MenuItemId).integer().not_null())
                    .col(ColumnDef::new(ItemTakeouts::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_takeouts_menu_item")
                            .from(ItemTakeouts::Table, ItemTakeouts::MenuItemId)
                            .to(MenuItems::Table, MenuItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemTakeouts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemExtras::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MenuItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum MenuItems {
    Table,
    Id,
    Name,
    Category,
    Price,
    Description,
    Available,
    CreatedAt,
}

#[derive(Iden)]
pub enum ItemExtras {
    Table,
    Id,
    MenuItemId,
    Name,
    Price,
}

#[derive(Iden)]
pub enum ItemTakeouts {
    Table,
    Id,
    MenuItemId,
    Name,
}
