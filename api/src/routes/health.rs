use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "gitHash": env!("GIT_HASH"),
        "buildTime": env!("BUILD_TIME"),
    }))
}
