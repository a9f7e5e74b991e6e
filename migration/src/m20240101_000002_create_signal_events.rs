use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SignalEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SignalEvents::ProductCode).string_len(32).not_null())
                    .col(ColumnDef::new(SignalEvents::Time).timestamp().not_null())
                    .col(ColumnDef::new(SignalEvents::Side).string_len(4).not_null()) // "BUY" or "SELL"
                    .col(ColumnDef::new(SignalEvents::Price).double().not_null())
                    .col(ColumnDef::new(SignalEvents::Size).double().not_null())
                    .primary_key(
                        Index::create()
                            .col(SignalEvents::ProductCode)
                            .col(SignalEvents::Time),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SignalEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SignalEvents {
    Table,
    ProductCode,
    Time,
    Side,
    Price,
    Size,
}
