use anyhow::Result;
use sea_orm::prelude::*;
use sea_orm::{ActiveValue, IntoActiveModel};
use shared::entity::users;
use std::sync::Arc;

use super::db_now;

pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, user_id: i32) -> Result<Option<users::Model>> {
        let user = users::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;
        Ok(user)
    }

    pub async fn create(&self, username: &str, password_hash: String) -> Result<users::Model> {
        let active_model = users::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            password: ActiveValue::Set(password_hash),
            created_at: ActiveValue::Set(db_now()),
            ..Default::default()
        };
        let user = users::Entity::insert(active_model)
            .exec_with_returning(self.db.as_ref())
            .await?;
        Ok(user)
    }

    /// Overwrite the username and, when given, the password hash
    pub async fn update_profile(
        &self,
        user: users::Model,
        username: &str,
        password_hash: Option<String>,
    ) -> Result<users::Model> {
        let mut active_model = user.into_active_model();
        active_model.username = ActiveValue::Set(username.to_string());
        if let Some(hash) = password_hash {
            active_model.password = ActiveValue::Set(hash);
        }
        let user = active_model.update(self.db.as_ref()).await?;
        Ok(user)
    }

    pub async fn count(&self) -> Result<usize> {
        let count = users::Entity::find()
            .count(self.db.as_ref())
            .await?;
        Ok(count as usize)
    }
}
