pub mod routes;
pub mod models;
pub mod errors;
pub mod auth;

use std::sync::Arc;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use crate::catalog::CatalogCache;
use crate::config::SummarizerConfig;
use crate::db::Database;
use crate::errors::SummarizerError;
use crate::pipeline::JobWorker;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub catalog: Arc<CatalogCache>,
    pub worker: JobWorker,
    /// Required bearer token. Falls back to `BENCHSUM_API_TOKEN` when unset.
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(db: Database, catalog: Arc<CatalogCache>, config: &SummarizerConfig) -> Self {
        let worker = JobWorker::new(db.clone(), catalog.clone(), config);
        Self {
            db,
            catalog,
            worker,
            api_token: config.api_token.clone(),
        }
    }
}

/// Open the store, load the catalog and build the shared state.
pub async fn create_app_state(config: &SummarizerConfig) -> Result<AppState, SummarizerError> {
    let db = Database::new(&config.database)?;
    let catalog = Arc::new(CatalogCache::new());
    catalog.refresh_from(&db)?;
    Ok(AppState::new(db, catalog, config))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/jobs", post(routes::jobs::create_job).get(routes::jobs::list_jobs))
        .route("/api/jobs/:id", get(routes::jobs::get_job))
        .route("/api/jobs/:id/stop", post(routes::jobs::stop_job))
        .route("/api/results", post(routes::results::ingest_results))
        .route("/api/benchmarks", get(routes::benchmarks::list_benchmarks).post(routes::benchmarks::import_benchmarks))
        .route("/api/benchmarks/:id/summary", get(routes::summaries::latest_summary))
        .route("/api/benchmarks/:id/summaries/:job_id", get(routes::summaries::get_summary))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth::api_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
