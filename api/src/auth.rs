//! Password hashing, session tokens and the authenticated-user extractors

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use shared::User;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sid";

const PBKDF2_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const TOKEN_LEN: usize = 32;

/// Hash a password with a fresh random salt, stored as `hex(hash).hex(salt)`
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let hash = derive_key(password, &salt);
    format!("{}.{}", hex::encode(hash), hex::encode(salt))
}

/// Check a password against a stored `hex(hash).hex(salt)` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((hash_hex, salt_hex)) = stored.split_once('.') else {
        return false;
    };
    let (Ok(expected), Ok(salt)) = (hex::decode(hash_hex), hex::decode(salt_hex)) else {
        return false;
    };
    let actual = derive_key(password, &salt);
    constant_time_eq(&actual, &expected)
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut out);
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Random URL-safe session token
pub fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_owned())
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = session_token(&jar).ok_or_else(ApiError::unauthenticated)?;
    state
        .users
        .user_for_session(&token)
        .await?
        .ok_or_else(ApiError::unauthenticated)
}

/// Signed-in user for JSON endpoints; rejects with 401
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(AuthUser)
    }
}

/// Signed-in user for HTML pages; redirects to the sign-in page instead of failing
pub struct PageUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await {
            Ok(user) => Ok(PageUser(user)),
            Err(ApiError::Unauthorized(_)) => Err(Redirect::to("/auth").into_response()),
            Err(err) => Err(err.into_response()),
        }
    }
}
