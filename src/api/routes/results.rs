use axum::{extract::State, Json};
use serde_json::Value;
use crate::api::AppState;
use crate::api::errors::ApiError;
use crate::ingest::{IngestReport, Ingestor};

/// Accepts a JSON array of raw result rows. Malformed rows are reported by
/// array index and do not block the rest of the batch.
pub async fn ingest_results(
    State(state): State<AppState>,
    Json(rows): Json<Vec<Value>>,
) -> Result<Json<IngestReport>, ApiError> {
    let ingestor = Ingestor::new(state.db.clone(), state.catalog.clone());
    let report = ingestor.ingest_values(rows)?;
    Ok(Json(report))
}
