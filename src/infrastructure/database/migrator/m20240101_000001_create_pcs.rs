//! Create pcs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pcs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pcs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pcs::Number).integer().not_null().unique_key())
                    .col(
                        ColumnDef::new(Pcs::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(Pcs::Specs).string())
                    .col(
                        ColumnDef::new(Pcs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pcs_status")
                    .table(Pcs::Table)
                    .col(Pcs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pcs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Pcs {
    Table,
    Id,
    Number,
    Status,
    Specs,
    CreatedAt,
}
