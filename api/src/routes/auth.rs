use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::User;

use crate::auth::{clear_session_cookie, session_cookie, session_token, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Create an account and sign it in.
///
/// # Errors
/// 400 when the username or password is too short, or the username is taken.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> ApiResult<(StatusCode, CookieJar, Json<User>)> {
    let user = state.users.register(&credentials.username, &credentials.password).await?;
    let token = state.users.start_session(user.id).await?;
    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(user)))
}

/// Verify credentials and start a session.
///
/// # Errors
/// 401 on an unknown username or wrong password.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> ApiResult<(CookieJar, Json<User>)> {
    let user = state.users.login(&credentials.username, &credentials.password).await?;
    let token = state.users.start_session(user.id).await?;
    let jar = jar.add(session_cookie(token, state.config.cookie_secure));
    Ok((jar, Json(user)))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<(CookieJar, Json<Value>)> {
    if let Some(token) = session_token(&jar) {
        state.users.end_session(&token).await?;
    }
    Ok((clear_session_cookie(jar), Json(json!({ "message": "Logged out" }))))
}

pub async fn current_user(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
