use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;
use crate::api::AppState;
use crate::api::errors::ApiError;
use crate::models::BenchmarkFile;

pub async fn list_benchmarks(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let benchmarks = state.db.list_benchmarks()?;
    Ok(Json(json!({ "benchmarks": benchmarks, "total": benchmarks.len() })))
}

/// Upsert definitions and reload the catalog so new jobs see them at once.
pub async fn import_benchmarks(
    State(state): State<AppState>,
    Json(file): Json<BenchmarkFile>,
) -> Result<Json<Value>, ApiError> {
    if let Some(bad) = file.benchmarks.iter().find(|b| b.id.trim().is_empty()) {
        return Err(ApiError::BadRequest(format!("benchmark with empty id (title '{}')", bad.title)));
    }

    for def in &file.benchmarks {
        state.db.upsert_benchmark(def)?;
    }
    let total = state.catalog.refresh_from(&state.db)?;
    info!(imported = file.benchmarks.len(), total, "Benchmarks imported");

    Ok(Json(json!({ "imported": file.benchmarks.len(), "total": total })))
}
