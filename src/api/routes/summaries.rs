use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use crate::api::AppState;
use crate::api::errors::ApiError;

pub async fn latest_summary(
    State(state): State<AppState>,
    Path(benchmark_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.db.latest_summary(&benchmark_id)?
        .map(|record| Json(record.document))
        .ok_or_else(|| ApiError::NotFound(format!("No summary for benchmark {}", benchmark_id)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path((benchmark_id, job_id)): Path<(String, u64)>,
) -> Result<Json<Value>, ApiError> {
    state.db.get_summary(&benchmark_id, job_id)?
        .map(|record| Json(record.document))
        .ok_or_else(|| ApiError::NotFound(format!("No summary for benchmark {} job {}", benchmark_id, job_id)))
}
