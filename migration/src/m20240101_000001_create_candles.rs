use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Candles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Candles::ProductCode).string_len(32).not_null()) // "BTC_JPY"
                    .col(ColumnDef::new(Candles::Duration).string_len(4).not_null()) // "1s", "1m", "1h", "1d"
                    .col(ColumnDef::new(Candles::Time).timestamp().not_null())
                    .col(ColumnDef::new(Candles::Open).double().not_null())
                    .col(ColumnDef::new(Candles::High).double().not_null())
                    .col(ColumnDef::new(Candles::Low).double().not_null())
                    .col(ColumnDef::new(Candles::Close).double().not_null())
                    .col(ColumnDef::new(Candles::Volume).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(Candles::ProductCode)
                            .col(Candles::Duration)
                            .col(Candles::Time),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Candles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Candles {
    Table,
    ProductCode,
    Duration,
    Time,
    Open,
    High,
    Low,
    Close,
    Volume,
}
