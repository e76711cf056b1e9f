use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use sea_orm::ActiveValue;
use shared::entity::sessions;
use std::sync::Arc;

use super::db_now;

pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, token: &str, user_id: i32, expires_at: DateTime<Utc>) -> Result<sessions::Model> {
        let active_model = sessions::ActiveModel {
            id: ActiveValue::Set(token.to_string()),
            user_id: ActiveValue::Set(user_id),
            expires_at: ActiveValue::Set(expires_at),
            created_at: ActiveValue::Set(db_now()),
        };
        let session = sessions::Entity::insert(active_model)
            .exec_with_returning(self.db.as_ref())
            .await?;
        Ok(session)
    }

    /// Session for `token` unless it is missing or expired at `now`
    pub async fn find_valid(&self, token: &str, now: DateTime<Utc>) -> Result<Option<sessions::Model>> {
        let session = sessions::Entity::find_by_id(token.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(session.filter(|s| s.expires_at > now))
    }

    pub async fn delete(&self, token: &str) -> Result<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
