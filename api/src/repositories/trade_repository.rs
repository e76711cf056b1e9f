use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, QueryOrder};
use shared::entity::trades;
use std::sync::Arc;

pub struct TradeRepository {
    db: Arc<DatabaseConnection>,
}

impl TradeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, trade_id: i32) -> Result<Option<trades::Model>> {
        let trade = trades::Entity::find_by_id(trade_id)
            .one(self.db.as_ref())
            .await?;
        Ok(trade)
    }

    /// All trades of a user, active ones first, newest first within each group
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<trades::Model>> {
        let trades = trades::Entity::find()
            .filter(trades::Column::UserId.eq(user_id))
            .order_by_desc(trades::Column::IsActive)
            .order_by_desc(trades::Column::CreatedAt)
            .order_by_desc(trades::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(trades)
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = trades::Entity::find()
            .filter(trades::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    pub async fn insert<C: ConnectionTrait>(conn: &C, active_model: trades::ActiveModel) -> Result<trades::Model> {
        let trade = trades::Entity::insert(active_model)
            .exec_with_returning(conn)
            .await?;
        Ok(trade)
    }

    pub async fn update<C: ConnectionTrait>(conn: &C, active_model: trades::ActiveModel) -> Result<trades::Model> {
        let trade = active_model.update(conn).await?;
        Ok(trade)
    }

    /// Close a trade in one conditional UPDATE; `None` when it was no longer active
    pub async fn close_if_active<C: ConnectionTrait>(
        conn: &C,
        trade_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<trades::Model>> {
        let result = trades::Entity::update_many()
            .col_expr(trades::Column::IsActive, Expr::value(false))
            .col_expr(trades::Column::ClosedAt, Expr::value(Some(now)))
            .col_expr(trades::Column::UpdatedAt, Expr::value(now))
            .filter(trades::Column::Id.eq(trade_id))
            .filter(trades::Column::IsActive.eq(true))
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        let trade = trades::Entity::find_by_id(trade_id).one(conn).await?;
        Ok(trade)
    }

    /// Bump `updated_at` while the trade is still active; false once it is closed
    pub async fn touch_if_active<C: ConnectionTrait>(conn: &C, trade_id: i32, now: DateTime<Utc>) -> Result<bool> {
        let result = trades::Entity::update_many()
            .col_expr(trades::Column::UpdatedAt, Expr::value(now))
            .filter(trades::Column::Id.eq(trade_id))
            .filter(trades::Column::IsActive.eq(true))
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
