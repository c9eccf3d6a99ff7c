use axum::{extract::State, Json};
use serde_json::{json, Value};
use crate::api::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "benchsum",
        "version": env!("CARGO_PKG_VERSION"),
        "active_jobs": state.worker.active_count(),
        "benchmarks": state.catalog.snapshot().len(),
    }))
}
