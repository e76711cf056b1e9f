//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trade_activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub trade_id: Option<i32>,
    #[sea_orm(column_name = "type")]
    pub activity_type: String, // "Trade Started", "Trade Modified", "Trade Stopped", ...
    pub symbol: String,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))", nullable)]
    pub price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((20, 8)))", nullable)]
    pub amount: Option<Decimal>,
    pub status: Option<String>, // "Completed", "Updated", "Closed", ...
    pub metadata: Option<Json>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::trades::Entity",
        from = "Column::TradeId",
        to = "super::trades::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Trades,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::trades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
