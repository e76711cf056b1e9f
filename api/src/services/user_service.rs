use chrono::{Duration, Utc};
use sea_orm::prelude::DatabaseConnection;
use serde::Deserialize;
use shared::entity::users;
use shared::User;
use std::sync::Arc;

use crate::auth::{hash_password, new_session_token, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::repositories::{SessionRepository, UserRepository};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: String,
    pub current_password: String,
    #[serde(default)]
    pub new_password: Option<String>,
}

pub struct UserService {
    repo: UserRepository,
    sessions: SessionRepository,
    session_ttl: Duration,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, session_ttl_hours: i64) -> Self {
        Self {
            repo: UserRepository::new(db.clone()),
            sessions: SessionRepository::new(db),
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    /// Create an account. Usernames are unique and trimmed.
    pub async fn register(&self, username: &str, password: &str) -> ApiResult<User> {
        let username = validate_username(username)?;
        validate_password(password)?;

        if self.repo.find_by_username(username).await?.is_some() {
            return Err(ApiError::validation("Username already exists"));
        }

        let user = self.repo.create(username, hash_password(password)).await?;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user.into())
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

        let user = self
            .repo
            .find_by_username(username.trim())
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password, &user.password) {
            tracing::warn!("Failed login for user {}", user.username);
            return Err(invalid());
        }
        Ok(user.into())
    }

    pub async fn get_user(&self, user_id: i32) -> ApiResult<User> {
        self.repo
            .find_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Change the username and optionally the password, after checking the current password
    pub async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> ApiResult<User> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !verify_password(&update.current_password, &user.password) {
            return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
        }

        let username = validate_username(&update.username)?;
        if username != user.username && self.is_taken(username, user.id).await? {
            return Err(ApiError::validation("Username already exists"));
        }

        let password_hash = match update.new_password.as_deref().filter(|p| !p.is_empty()) {
            Some(new_password) => {
                validate_password(new_password)?;
                Some(hash_password(new_password))
            }
            None => None,
        };

        let updated = self.repo.update_profile(user, username, password_hash).await?;
        tracing::info!("Updated profile of user {}", updated.id);
        Ok(updated.into())
    }

    async fn is_taken(&self, username: &str, own_id: i32) -> ApiResult<bool> {
        let existing: Option<users::Model> = self.repo.find_by_username(username).await?;
        Ok(existing.is_some_and(|u| u.id != own_id))
    }

    /// Start a session and return its token
    pub async fn start_session(&self, user_id: i32) -> ApiResult<String> {
        let token = new_session_token();
        self.sessions
            .create(&token, user_id, Utc::now() + self.session_ttl)
            .await?;
        Ok(token)
    }

    /// User owning a live session, if any
    pub async fn user_for_session(&self, token: &str) -> ApiResult<Option<User>> {
        let Some(session) = self.sessions.find_valid(token, Utc::now()).await? else {
            return Ok(None);
        };
        let user = self.repo.find_by_id(session.user_id).await?;
        Ok(user.map(User::from))
    }

    pub async fn end_session(&self, token: &str) -> ApiResult<()> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> ApiResult<u64> {
        let removed = self.sessions.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::debug!("Removed {} expired sessions", removed);
        }
        Ok(removed)
    }

    pub async fn count_users(&self) -> ApiResult<usize> {
        Ok(self.repo.count().await?)
    }
}

fn validate_username(username: &str) -> ApiResult<&str> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    Ok(username)
}

fn validate_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  demo ").unwrap(), "demo");
        assert!(validate_username("ab").is_err());
        assert!(validate_username("   ").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }
}
