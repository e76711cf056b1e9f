use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::filters::{filter_and_sort_closed_trades, filter_and_sort_trades, ClosedTradeCriteria, TradeCriteria};
use shared::Trade;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::{NewTrade, TradeUpdate};
use crate::state::AppState;

pub async fn list_trades(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<Trade>>> {
    let trades = state.trades.list_trades(user.id).await?;
    Ok(Json(trades))
}

/// Open a trade.
///
/// # Errors
/// 400 when a required field is missing or a price/quantity is not positive.
pub async fn create_trade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(new_trade): Json<NewTrade>,
) -> ApiResult<(StatusCode, Json<Trade>)> {
    let trade = state.trades.create_trade(user.id, new_trade).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// Edit an active trade.
///
/// # Errors
/// 404 for an unknown trade, 403 for another user's trade, 409 once closed.
pub async fn update_trade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trade_id): Path<i32>,
    Json(update): Json<TradeUpdate>,
) -> ApiResult<Json<Trade>> {
    let trade = state.trades.update_trade(user.id, trade_id, update).await?;
    Ok(Json(trade))
}

/// Close an active trade.
///
/// # Errors
/// 404 for an unknown trade, 403 for another user's trade, 409 when already closed.
pub async fn stop_trade(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trade_id): Path<i32>,
) -> ApiResult<Json<Trade>> {
    let trade = state.trades.stop_trade(user.id, trade_id).await?;
    Ok(Json(trade))
}

pub async fn filter_trades(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(criteria): Query<TradeCriteria>,
) -> ApiResult<Json<Vec<Trade>>> {
    let trades = state.trades.list_trades(user.id).await?;
    let filtered = filter_and_sort_trades(&trades, &criteria)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(filtered))
}

pub async fn closed_trades(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(criteria): Query<ClosedTradeCriteria>,
) -> ApiResult<Json<Vec<Trade>>> {
    let trades = state.trades.list_trades(user.id).await?;
    let filtered = filter_and_sort_closed_trades(&trades, &criteria)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(filtered))
}
