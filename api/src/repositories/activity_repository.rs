use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, QueryOrder, QuerySelect};
use shared::entity::trade_activities;
use std::sync::Arc;

use super::db_now;

/// Fields of an activity row before it is written
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: i32,
    pub trade_id: Option<i32>,
    pub activity_type: String,
    pub symbol: String,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Newest activities of a user, at most `limit` of them
    pub async fn recent_for_user(&self, user_id: i32, limit: u64) -> Result<Vec<trade_activities::Model>> {
        let activities = trade_activities::Entity::find()
            .filter(trade_activities::Column::UserId.eq(user_id))
            .order_by_desc(trade_activities::Column::CreatedAt)
            .order_by_desc(trade_activities::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(activities)
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<trade_activities::Model>> {
        let activities = trade_activities::Entity::find()
            .filter(trade_activities::Column::UserId.eq(user_id))
            .order_by_desc(trade_activities::Column::CreatedAt)
            .order_by_desc(trade_activities::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(activities)
    }

    /// Append an activity. Its timestamp is kept strictly after the user's latest one.
    pub async fn append<C: ConnectionTrait>(conn: &C, activity: NewActivity) -> Result<trade_activities::Model> {
        let latest = trade_activities::Entity::find()
            .filter(trade_activities::Column::UserId.eq(activity.user_id))
            .order_by_desc(trade_activities::Column::CreatedAt)
            .order_by_desc(trade_activities::Column::Id)
            .one(conn)
            .await?
            .map(|a| a.created_at);

        let active_model = trade_activities::ActiveModel {
            user_id: ActiveValue::Set(activity.user_id),
            trade_id: ActiveValue::Set(activity.trade_id),
            activity_type: ActiveValue::Set(activity.activity_type),
            symbol: ActiveValue::Set(activity.symbol),
            price: ActiveValue::Set(activity.price),
            amount: ActiveValue::Set(activity.amount),
            status: ActiveValue::Set(activity.status),
            metadata: ActiveValue::Set(activity.metadata),
            created_at: ActiveValue::Set(next_timestamp(db_now(), latest)),
            ..Default::default()
        };
        let model = trade_activities::Entity::insert(active_model)
            .exec_with_returning(conn)
            .await?;
        Ok(model)
    }
}

fn next_timestamp(now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match latest {
        Some(latest) if now <= latest => latest + Duration::microseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_timestamp_bumps_past_latest() {
        let t = Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap();
        assert_eq!(next_timestamp(t, None), t);
        assert_eq!(next_timestamp(t, Some(t - Duration::seconds(1))), t);
        assert_eq!(next_timestamp(t, Some(t)), t + Duration::microseconds(1));
        let ahead = t + Duration::seconds(5);
        assert_eq!(next_timestamp(t, Some(ahead)), ahead + Duration::microseconds(1));
    }
}
