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
                    .table(TradeActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TradeActivities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TradeActivities::UserId).integer().not_null())
                    .col(ColumnDef::new(TradeActivities::TradeId).integer().null())
                    .col(ColumnDef::new(TradeActivities::Type).string_len(64).not_null())
                    .col(ColumnDef::new(TradeActivities::Symbol).string_len(32).not_null())
                    .col(decimal_col(manager, TradeActivities::Price, 20, 8).null())
                    .col(decimal_col(manager, TradeActivities::Amount, 20, 8).null())
                    .col(ColumnDef::new(TradeActivities::Status).string_len(32).null())
                    .col(ColumnDef::new(TradeActivities::Metadata).json().null())
                    .col(timestamp_col(manager, TradeActivities::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trade_activities_user")
                            .from(TradeActivities::Table, TradeActivities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trade_activities_trade")
                            .from(TradeActivities::Table, TradeActivities::TradeId)
                            .to(Trades::Table, Trades::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_trade_activities_user_created")
                    .table(TradeActivities::Table)
                    .col(TradeActivities::UserId)
                    .col(TradeActivities::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TradeActivities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TradeActivities {
    Table,
    Id,
    UserId,
    TradeId,
    Type,
    Symbol,
    Price,
    Amount,
    Status,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
