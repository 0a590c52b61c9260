//! Migration: Create the examples table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Examples::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Examples::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Examples::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Examples::Age).integer().not_null().default(0))
                    .col(ColumnDef::new(Examples::Email).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Examples::Active)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Dates keep their zone suffix, so they are stored as text.
                    .col(ColumnDef::new(Examples::Birthday).text().null())
                    .col(ColumnDef::new(Examples::CreatedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_examples_email")
                    .table(Examples::Table)
                    .col(Examples::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Examples::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
enum Examples {
    Table,
    Id,
    Name,
    Age,
    Email,
    Active,
    Birthday,
    CreatedAt,
}
