use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::json;
use crate::api::AppState;

pub const API_TOKEN_ENV: &str = "BENCHSUM_API_TOKEN";

pub async fn api_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let expected = state
        .api_token
        .clone()
        .or_else(|| std::env::var(API_TOKEN_ENV).ok())
        .filter(|t| !t.is_empty());

    // Health stays open for probes.
    if let Some(expected_token) = expected {
        if request.uri().path() != "/api/health" {
            let auth_header = request.headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok());

            match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
                Some(token) if token == expected_token => {}
                Some(_) => {
                    return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid API token"}))));
                }
                None => {
                    return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Missing Authorization header"}))));
                }
            }
        }
    }

    Ok(next.run(request).await)
}
