use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductPrices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductPrices::ProductId).integer().not_null())
                    .col(ColumnDef::new(ProductPrices::CurrencyId).integer().not_null())
                    .col(
                        ColumnDef::new(ProductPrices::Price)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductPrices::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(ProductPrices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // No unique constraint on (product_id, currency_id): the ledger is
        // append-only and repeated derivation stacks rows for the same pair.
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_product_prices_product_id")
                    .from(ProductPrices::Table, ProductPrices::ProductId)
                    .to(Products::Table, Products::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_product_prices_currency_id")
                    .from(ProductPrices::Table, ProductPrices::CurrencyId)
                    .to(Currencies::Table, Currencies::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_prices_product_id")
                    .table(ProductPrices::Table)
                    .col(ProductPrices::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductPrices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductPrices {
    Table,
    Id,
    ProductId,
    CurrencyId,
    Price,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Currencies {
    Table,
    Id,
}
