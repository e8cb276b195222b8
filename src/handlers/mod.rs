pub mod admin;
pub mod catalog;
pub mod leads;
pub mod transactions;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::AppState;

/// Uniform success envelope.
pub fn envelope<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "data": data }))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
