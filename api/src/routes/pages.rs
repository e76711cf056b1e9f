//! Server-rendered HTML pages

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::{cookie::CookieJar, Form};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::display::Tone;
use shared::filters::{
    filter_and_sort_activities, filter_and_sort_closed_trades, filter_and_sort_trades, paginate, parse_date,
    position_counts, ActivityCriteria, ActivitySort, ClosedTradeCriteria, TradeCriteria, TradeSort, DASHBOARD_PAGE_SIZE,
};
use shared::metrics::{compute_portfolio_stats, compute_trading_performance};
use shared::{Theme, User};

use crate::auth::{clear_session_cookie, session_cookie, session_token, PageUser};
use crate::error::{ApiError, ApiResult};
use crate::routes::auth::Credentials;
use crate::routes::theme::{current_theme, theme_cookie};
use crate::services::{NewTrade, ProfileUpdate, TradeUpdate};
use crate::state::AppState;
use crate::views::{
    ActivityRow, AuthPage, DashboardPage, HistoryPage, Layout, ProfilePage, SelectOption, TradeCard, TradeFormPage,
    TradeFormValues, TradesPage,
};

/// Recent activity rows on the dashboard
const DASHBOARD_ACTIVITY_LIMIT: u64 = 5;

const TRADE_SORT_OPTIONS: &[(&str, &str)] = &[
    ("newest", "Newest first"),
    ("oldest", "Oldest first"),
    ("profitDesc", "Highest profit"),
    ("profitAsc", "Lowest profit"),
];
const ACTIVITY_SORT_OPTIONS: &[(&str, &str)] = &[("newest", "Newest first"), ("oldest", "Oldest first")];
const POSITION_OPTIONS: &[(&str, &str)] = &[("Long", "Long"), ("Short", "Short")];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth", get(auth_page))
        .route("/auth/login", post(login_submit))
        .route("/auth/register", post(register_submit))
        .route("/auth/logout", post(logout_submit))
        .route("/", get(dashboard))
        .route("/trades", get(active_trades))
        .route("/trades/new", get(new_trade_form).post(create_trade_submit))
        .route("/trades/:id/edit", get(edit_trade_form).post(update_trade_submit))
        .route("/trades/:id/stop", post(stop_trade_submit))
        .route("/history", get(history))
        .route("/profile", get(profile).post(profile_submit))
        .route("/theme", post(toggle_theme))
}

fn render(status: StatusCode, page: impl askama::Template) -> ApiResult<Response> {
    Ok((status, Html(page.render()?)).into_response())
}

/// Client errors are shown on the re-rendered page, anything else propagates
fn page_message(err: ApiError) -> ApiResult<(StatusCode, String)> {
    match err {
        ApiError::Internal(_) => Err(err),
        other => Ok((other.status(), other.to_string())),
    }
}

fn layout(user: &User, jar: &CookieJar, nav: &'static str, uri: &Uri) -> Layout {
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Layout::new(user, current_theme(jar), nav, path)
}

/// Only same-site relative paths are followed
fn safe_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}

fn parse_decimal(value: &str, field: &str) -> ApiResult<Option<Decimal>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<Decimal>()
        .map(Some)
        .map_err(|_| ApiError::validation(format!("{} must be a number", field)))
}

fn require_decimal(value: &str, field: &str) -> ApiResult<Decimal> {
    parse_decimal(value, field)?.ok_or_else(|| ApiError::validation(format!("{} is required", field)))
}

fn new_trade_from_form(form: &TradeFormValues) -> ApiResult<NewTrade> {
    Ok(NewTrade {
        symbol: form.symbol.clone(),
        position: form.position.clone(),
        quantity: require_decimal(&form.quantity, "Quantity")?,
        entry_price: require_decimal(&form.entry_price, "Entry price")?,
        take_profit: require_decimal(&form.take_profit, "Take profit")?,
        stop_loss: require_decimal(&form.stop_loss, "Stop loss")?,
        api_used: form.api_used.clone(),
        notes: Some(form.notes.clone()),
        current_price: parse_decimal(&form.current_price, "Current price")?,
    })
}

fn update_from_form(form: &TradeFormValues) -> ApiResult<TradeUpdate> {
    Ok(TradeUpdate {
        symbol: Some(form.symbol.clone()),
        position: Some(form.position.clone()),
        quantity: parse_decimal(&form.quantity, "Quantity")?,
        entry_price: parse_decimal(&form.entry_price, "Entry price")?,
        current_price: parse_decimal(&form.current_price, "Current price")?,
        take_profit: parse_decimal(&form.take_profit, "Take profit")?,
        stop_loss: parse_decimal(&form.stop_loss, "Stop loss")?,
        profit_loss: parse_decimal(&form.profit_loss, "Profit/loss")?,
        profit_loss_percentage: parse_decimal(&form.profit_loss_percentage, "Profit/loss %")?,
        api_used: Some(form.api_used.clone()),
        notes: Some(form.notes.clone()),
    })
}

// ---- sign in ----

#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub mode: Option<String>,
}

fn auth_mode(mode: Option<&str>) -> &'static str {
    match mode {
        Some("register") => "register",
        _ => "login",
    }
}

async fn auth_page(jar: CookieJar, Query(query): Query<AuthQuery>) -> ApiResult<Response> {
    render(
        StatusCode::OK,
        AuthPage {
            theme_class: current_theme(&jar).as_class(),
            mode: auth_mode(query.mode.as_deref()),
            username: String::new(),
            error: None,
        },
    )
}

async fn sign_in_result(
    state: &AppState,
    jar: CookieJar,
    mode: &'static str,
    username: String,
    result: ApiResult<User>,
) -> ApiResult<Response> {
    match result {
        Ok(user) => {
            let token = state.users.start_session(user.id).await?;
            let jar = jar.add(session_cookie(token, state.config.cookie_secure));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(err) => {
            let (status, message) = page_message(err)?;
            render(
                status,
                AuthPage {
                    theme_class: current_theme(&jar).as_class(),
                    mode,
                    username,
                    error: Some(message),
                },
            )
        }
    }
}

async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> ApiResult<Response> {
    let result = state.users.login(&credentials.username, &credentials.password).await;
    sign_in_result(&state, jar, "login", credentials.username, result).await
}

async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> ApiResult<Response> {
    let result = state.users.register(&credentials.username, &credentials.password).await;
    sign_in_result(&state, jar, "register", credentials.username, result).await
}

async fn logout_submit(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Response> {
    if let Some(token) = session_token(&jar) {
        state.users.end_session(&token).await?;
    }
    Ok((clear_session_cookie(jar), Redirect::to("/auth")).into_response())
}

// ---- dashboard and trades ----

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub page: Option<usize>,
}

async fn dashboard(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Response> {
    let trades = state.trades.list_trades(user.id).await?;
    let stats = compute_portfolio_stats(&trades, Utc::now());
    let active = filter_and_sort_trades(
        &trades,
        &TradeCriteria {
            active_only: true,
            ..Default::default()
        },
    );
    let page = paginate(&active, query.page.unwrap_or(1), DASHBOARD_PAGE_SIZE);
    let activities = state
        .trades
        .recent_activities(user.id, Some(DASHBOARD_ACTIVITY_LIMIT))
        .await?;

    render(
        StatusCode::OK,
        DashboardPage {
            layout: layout(&user, &jar, "dashboard", &uri),
            profit_loss_class: Tone::of(stats.profit_loss).css_class(),
            stats,
            cards: page.items.iter().map(|t| TradeCard::from(*t)).collect(),
            page: page.page,
            page_count: page.page_count,
            activities: activities.iter().map(ActivityRow::from).collect(),
        },
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct TradesQuery {
    pub position: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

async fn active_trades(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Query(query): Query<TradesQuery>,
) -> ApiResult<Response> {
    let trades = state.trades.list_trades(user.id).await?;

    let position = match query.position.as_deref().map(str::to_lowercase) {
        Some(p) if p == "long" || p == "short" => p,
        _ => "all".to_string(),
    };
    let sort: TradeSort = query.sort.as_deref().and_then(|s| s.parse().ok()).unwrap_or_default();
    let search = query.search.unwrap_or_default();

    let criteria = TradeCriteria {
        active_only: true,
        position: Some(position.clone()),
        search: Some(search.clone()),
        sort,
    };
    let cards = filter_and_sort_trades(&trades, &criteria)
        .into_iter()
        .map(TradeCard::from)
        .collect();

    render(
        StatusCode::OK,
        TradesPage {
            layout: layout(&user, &jar, "trades", &uri),
            cards,
            counts: position_counts(&trades),
            position,
            search,
            sort_options: SelectOption::list(TRADE_SORT_OPTIONS, sort.as_str()),
        },
    )
}

fn trade_form_page(
    layout: Layout,
    trade_id: Option<i32>,
    form: TradeFormValues,
    error: Option<String>,
) -> TradeFormPage {
    let position_options = SelectOption::list(POSITION_OPTIONS, &form.position);
    match trade_id {
        Some(id) => TradeFormPage {
            layout,
            title: "Edit Trade",
            action: format!("/trades/{}/edit", id),
            editing: true,
            form,
            position_options,
            error,
        },
        None => TradeFormPage {
            layout,
            title: "New Trade",
            action: "/trades/new".to_string(),
            editing: false,
            form,
            position_options,
            error,
        },
    }
}

async fn new_trade_form(PageUser(user): PageUser, jar: CookieJar, uri: Uri) -> ApiResult<Response> {
    let form = TradeFormValues {
        position: "Long".to_string(),
        ..Default::default()
    };
    render(
        StatusCode::OK,
        trade_form_page(layout(&user, &jar, "trades", &uri), None, form, None),
    )
}

async fn create_trade_submit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Form(form): Form<TradeFormValues>,
) -> ApiResult<Response> {
    let result = match new_trade_from_form(&form) {
        Ok(new_trade) => state.trades.create_trade(user.id, new_trade).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(_) => Ok(Redirect::to("/trades").into_response()),
        Err(err) => {
            let (status, message) = page_message(err)?;
            let page = trade_form_page(layout(&user, &jar, "trades", &uri), None, form, Some(message));
            render(status, page)
        }
    }
}

async fn edit_trade_form(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Path(trade_id): Path<i32>,
) -> ApiResult<Response> {
    let trade = state.trades.get_trade(user.id, trade_id).await?;
    if !trade.is_active {
        return Ok(Redirect::to("/history?tab=closed").into_response());
    }
    let page = trade_form_page(
        layout(&user, &jar, "trades", &uri),
        Some(trade.id),
        TradeFormValues::from(&trade),
        None,
    );
    render(StatusCode::OK, page)
}

async fn update_trade_submit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Path(trade_id): Path<i32>,
    Form(form): Form<TradeFormValues>,
) -> ApiResult<Response> {
    let result = match update_from_form(&form) {
        Ok(update) => state.trades.update_trade(user.id, trade_id, update).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(_) => Ok(Redirect::to("/trades").into_response()),
        Err(err) => {
            let (status, message) = page_message(err)?;
            let page = trade_form_page(
                layout(&user, &jar, "trades", &uri),
                Some(trade_id),
                form,
                Some(message),
            );
            render(status, page)
        }
    }
}

async fn stop_trade_submit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    Path(trade_id): Path<i32>,
) -> ApiResult<Response> {
    match state.trades.stop_trade(user.id, trade_id).await {
        Ok(_) | Err(ApiError::Conflict(_)) => Ok(Redirect::to("/trades").into_response()),
        Err(err) => Err(err),
    }
}

// ---- history ----

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub tab: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

async fn history(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    let from_date = query.from.as_deref().and_then(parse_date);
    let to_date = query.to.as_deref().and_then(parse_date);
    let search = query.search.unwrap_or_default();
    let activity_type = query.activity_type.unwrap_or_default();
    let sort = query.sort.as_deref().unwrap_or_default();

    let mut page = HistoryPage {
        layout: layout(&user, &jar, "history", &uri),
        tab: "activity",
        activities: Vec::new(),
        closed: Vec::new(),
        from_date: from_date.map(|d| d.to_string()).unwrap_or_default(),
        to_date: to_date.map(|d| d.to_string()).unwrap_or_default(),
        activity_type: activity_type.clone(),
        search: search.clone(),
        sort_options: Vec::new(),
    };

    if query.tab.as_deref() == Some("closed") {
        let sort: TradeSort = sort.parse().unwrap_or_default();
        let trades = state.trades.list_trades(user.id).await?;
        let criteria = ClosedTradeCriteria {
            from_date,
            to_date,
            search: Some(search),
            sort,
        };
        page.tab = "closed";
        page.closed = filter_and_sort_closed_trades(&trades, &criteria)
            .into_iter()
            .map(TradeCard::from)
            .collect();
        page.sort_options = SelectOption::list(TRADE_SORT_OPTIONS, sort.as_str());
    } else {
        let sort: ActivitySort = sort.parse().unwrap_or_default();
        let activities = state.trades.all_activities(user.id).await?;
        let criteria = ActivityCriteria {
            from_date,
            to_date,
            activity_type: Some(activity_type),
            search: Some(search),
            sort,
        };
        page.activities = filter_and_sort_activities(&activities, &criteria)
            .into_iter()
            .map(ActivityRow::from)
            .collect();
        page.sort_options = SelectOption::list(ACTIVITY_SORT_OPTIONS, sort.as_str());
    }

    render(StatusCode::OK, page)
}

// ---- profile ----

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub current_password: String,
    pub new_password: String,
}

async fn profile(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
) -> ApiResult<Response> {
    let trades = state.trades.list_trades(user.id).await?;
    let page = ProfilePage::new(
        layout(&user, &jar, "profile", &uri),
        &user,
        compute_trading_performance(&trades),
    );
    render(StatusCode::OK, page)
}

async fn profile_submit(
    State(state): State<AppState>,
    PageUser(user): PageUser,
    jar: CookieJar,
    uri: Uri,
    Form(form): Form<ProfileForm>,
) -> ApiResult<Response> {
    let update = ProfileUpdate {
        username: form.username,
        current_password: form.current_password,
        new_password: Some(form.new_password).filter(|p| !p.is_empty()),
    };
    let trades = state.trades.list_trades(user.id).await?;
    let performance = compute_trading_performance(&trades);

    match state.users.update_profile(user.id, update).await {
        Ok(updated) => {
            let mut page = ProfilePage::new(layout(&updated, &jar, "profile", &uri), &updated, performance);
            page.notice = Some("Profile updated".to_string());
            render(StatusCode::OK, page)
        }
        Err(err) => {
            let (status, message) = page_message(err)?;
            let mut page = ProfilePage::new(layout(&user, &jar, "profile", &uri), &user, performance);
            page.error = Some(message);
            render(status, page)
        }
    }
}

// ---- theme ----

#[derive(Debug, Default, Deserialize)]
pub struct ThemeForm {
    pub next: Option<String>,
}

async fn toggle_theme(jar: CookieJar, Form(form): Form<ThemeForm>) -> Response {
    let theme: Theme = current_theme(&jar).toggled();
    let target = safe_redirect_target(form.next.as_deref()).to_string();
    (jar.add(theme_cookie(theme)), Redirect::to(&target)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(Some("/history?tab=closed")), "/history?tab=closed");
        assert_eq!(safe_redirect_target(Some("//evil.example")), "/");
        assert_eq!(safe_redirect_target(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect_target(None), "/");
    }

    #[test]
    fn test_new_trade_from_form() {
        let form = TradeFormValues {
            symbol: "BTC/USD".to_string(),
            position: "Long".to_string(),
            quantity: "0.5".to_string(),
            entry_price: "100".to_string(),
            take_profit: "120".to_string(),
            stop_loss: "90".to_string(),
            api_used: "Binance".to_string(),
            ..Default::default()
        };
        let new_trade = new_trade_from_form(&form).unwrap();
        assert_eq!(new_trade.quantity, dec!(0.5));
        assert_eq!(new_trade.current_price, None);

        let missing = TradeFormValues {
            quantity: String::new(),
            ..form.clone()
        };
        assert!(matches!(new_trade_from_form(&missing), Err(ApiError::Validation(_))));

        let garbage = TradeFormValues {
            entry_price: "a lot".to_string(),
            ..form
        };
        assert!(matches!(new_trade_from_form(&garbage), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_update_from_form_leaves_blank_numbers_untouched() {
        let form = TradeFormValues {
            symbol: "ETH/USD".to_string(),
            position: "Short".to_string(),
            current_price: "2500".to_string(),
            ..Default::default()
        };
        let update = update_from_form(&form).unwrap();
        assert_eq!(update.current_price, Some(dec!(2500)));
        assert_eq!(update.quantity, None);
        assert_eq!(update.position.as_deref(), Some("Short"));
    }

    #[test]
    fn test_auth_mode() {
        assert_eq!(auth_mode(Some("register")), "register");
        assert_eq!(auth_mode(Some("other")), "login");
        assert_eq!(auth_mode(None), "login");
    }
}
