use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use crate::api::AppState;
use crate::api::errors::ApiError;
use crate::api::models::{CreateJobRequest, JobCreatedResponse, ListQuery};
use crate::pipeline::JobStatus;

pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobCreatedResponse>), ApiError> {
    let benchmark_id = req.benchmark_id.trim();
    if benchmark_id.is_empty() {
        return Err(ApiError::BadRequest("benchmark_id is required".into()));
    }

    // Unknown benchmarks still get a job; it ends FAILED with the reason.
    let (job_id, _handle) = state.worker.submit(benchmark_id)?;
    info!(job_id, benchmark_id = %benchmark_id, "Job accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            job_id,
            benchmark_id: benchmark_id.to_string(),
            status: JobStatus::Created.to_string(),
        }),
    ))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let jobs = state.db.list_jobs(limit, offset)?;
    Ok(Json(json!({ "jobs": jobs, "total": jobs.len() })))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let job = state.db.get_job(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", id)))?;

    let mut body = serde_json::to_value(&job).map_err(crate::errors::SummarizerError::from)?;
    body["active"] = json!(state.worker.is_active(id));
    Ok(Json(body))
}

pub async fn stop_job(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    if state.worker.stop(id) {
        Ok(Json(json!({"stopped": true, "job_id": id})))
    } else {
        Err(ApiError::NotFound(format!("No active job {}", id)))
    }
}
