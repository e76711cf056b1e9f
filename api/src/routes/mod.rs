pub mod activities;
pub mod auth;
pub mod health;
pub mod pages;
pub mod profile;
pub mod stats;
pub mod theme;
pub mod trades;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// JSON endpoints mounted under `/api`
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::current_user))
        .route("/user/profile", patch(profile::update_profile))
        .route("/trades", get(trades::list_trades).post(trades::create_trade))
        .route("/trades/filter", get(trades::filter_trades))
        .route("/trades/closed", get(trades::closed_trades))
        .route("/trades/:id", patch(trades::update_trade))
        .route("/trades/:id/stop", post(trades::stop_trade))
        .route("/trade-activities", get(activities::recent_activities))
        .route("/trade-activities/filter", get(activities::filter_activities))
        .route("/portfolio/stats", get(stats::portfolio_stats))
        .route("/performance", get(stats::performance))
        .route("/theme", post(theme::set_theme))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .merge(pages::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
