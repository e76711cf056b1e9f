use axum::{extract::State, Json};
use chrono::Utc;
use shared::metrics::{compute_portfolio_stats, compute_trading_performance, PortfolioStats, TradingPerformance};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn portfolio_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<PortfolioStats>> {
    let trades = state.trades.list_trades(user.id).await?;
    Ok(Json(compute_portfolio_stats(&trades, Utc::now())))
}

pub async fn performance(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<TradingPerformance>> {
    let trades = state.trades.list_trades(user.id).await?;
    Ok(Json(compute_trading_performance(&trades)))
}
