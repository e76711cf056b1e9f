use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::theme::{Theme, COOKIE_NAME};

#[derive(Debug, Default, Deserialize)]
pub struct ThemeRequest {
    pub theme: Option<Theme>,
}

pub fn current_theme(jar: &CookieJar) -> Theme {
    Theme::from_cookie(jar.get(COOKIE_NAME).map(|c| c.value()))
}

pub fn theme_cookie(theme: Theme) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, theme.as_str()))
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

/// Set the theme given in the body, or toggle the current one when none is given
pub async fn set_theme(jar: CookieJar, body: Option<Json<ThemeRequest>>) -> (CookieJar, Json<Value>) {
    let requested = body.and_then(|Json(req)| req.theme);
    let theme = requested.unwrap_or_else(|| current_theme(&jar).toggled());
    (jar.add(theme_cookie(theme)), Json(json!({ "theme": theme })))
}
