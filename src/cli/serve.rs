use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use crate::cli::commands::ServeArgs;
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use crate::api;
use tracing::{info, warn};

pub async fn handle_serve(args: ServeArgs, mut config: SummarizerConfig) -> Result<(), SummarizerError> {
    if let Some(db) = args.db {
        config.database = db;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(workers) = args.workers {
        config.max_concurrent_jobs = workers.max(1);
    }

    info!(host = %config.server.host, port = config.server.port, db = %config.database, "Starting API server");

    let state = api::create_app_state(&config).await?;
    let interrupted = state.db.fail_interrupted_jobs()?;
    if interrupted > 0 {
        warn!(jobs = interrupted, "Marked jobs from a previous run as FAILED");
    }

    let shutdown = CancellationToken::new();
    let refresher = (config.catalog_refresh_secs > 0).then(|| {
        Arc::clone(&state.catalog).spawn_refresh(
            state.db.clone(),
            Duration::from_secs(config.catalog_refresh_secs),
            shutdown.clone(),
        )
    });

    let worker = state.worker.clone();
    let app = api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            signal.cancel();
        })
        .await
        .map_err(|e| SummarizerError::Internal(format!("Server error: {}", e)))?;

    shutdown.cancel();
    worker.shutdown();
    if let Some(handle) = refresher {
        let _ = handle.await;
    }
    Ok(())
}
