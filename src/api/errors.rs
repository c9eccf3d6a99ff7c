use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::SummarizerError;

impl IntoResponse for SummarizerError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            SummarizerError::Config(_) | SummarizerError::Decode(_) | SummarizerError::Json(_) => StatusCode::BAD_REQUEST,
            SummarizerError::UnknownBenchmark(_) => StatusCode::NOT_FOUND,
            SummarizerError::InvalidTransition(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// Handler error: a request-level rejection or an underlying failure.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Summarizer(SummarizerError),
}

impl From<SummarizerError> for ApiError {
    fn from(e: SummarizerError) -> Self {
        ApiError::Summarizer(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(json!({"error": msg}))).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response(),
            ApiError::Summarizer(e) => e.into_response(),
        }
    }
}
