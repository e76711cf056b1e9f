use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use shared::filters::{filter_and_sort_activities, ActivityCriteria};
use shared::Activity;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

/// Newest activities first; `limit` defaults to 10 and is capped at 500
pub async fn recent_activities(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<Activity>>> {
    let activities = state.trades.recent_activities(user.id, query.limit).await?;
    Ok(Json(activities))
}

pub async fn filter_activities(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(criteria): Query<ActivityCriteria>,
) -> ApiResult<Json<Vec<Activity>>> {
    let activities = state.trades.all_activities(user.id).await?;
    let filtered = filter_and_sort_activities(&activities, &criteria)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(filtered))
}
