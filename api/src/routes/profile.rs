use axum::{extract::State, Json};
use shared::User;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::ProfileUpdate;
use crate::state::AppState;

/// Change the username and optionally the password.
///
/// # Errors
/// 401 when `currentPassword` is wrong, 400 when the new values fail validation.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let user = state.users.update_profile(user.id, update).await?;
    Ok(Json(user))
}
