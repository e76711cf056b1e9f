use sea_orm_migration::prelude::*;

use crate::{decimal_col, timestamp_col};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trades::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Trades::UserId).integer().not_null())
                    .col(ColumnDef::new(Trades::Symbol).string_len(32).not_null())
                    .col(decimal_col(manager, Trades::EntryPrice, 20, 8).not_null())
                    .col(decimal_col(manager, Trades::CurrentPrice, 20, 8).null())
                    .col(ColumnDef::new(Trades::Position).string_len(16).not_null()) // "Long" or "Short"
                    .col(decimal_col(manager, Trades::Quantity, 20, 8).not_null())
                    .col(decimal_col(manager, Trades::TakeProfit, 20, 8).null())
                    .col(decimal_col(manager, Trades::StopLoss, 20, 8).null())
                    .col(decimal_col(manager, Trades::ProfitLoss, 20, 8).null())
                    .col(decimal_col(manager, Trades::ProfitLossPercentage, 10, 4).null())
                    .col(ColumnDef::new(Trades::ApiUsed).text().null())
                    .col(ColumnDef::new(Trades::Notes).text().null())
                    .col(ColumnDef::new(Trades::IsActive).boolean().not_null().default(true))
                    .col(timestamp_col(manager, Trades::CreatedAt).not_null())
                    .col(timestamp_col(manager, Trades::UpdatedAt).not_null())
                    .col(timestamp_col(manager, Trades::ClosedAt).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_user")
                            .from(Trades::Table, Trades::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trades_user_active")
                    .table(Trades::Table)
                    .col(Trades::UserId)
                    .col(Trades::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trades::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
    UserId,
    Symbol,
    EntryPrice,
    CurrentPrice,
    Position,
    Quantity,
    TakeProfit,
    StopLoss,
    ProfitLoss,
    ProfitLossPercentage,
    ApiUsed,
    Notes,
    IsActive,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
