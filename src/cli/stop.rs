use crate::cli::api_request;
use crate::cli::commands::StopArgs;
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use tracing::info;

pub async fn handle_stop(args: StopArgs, config: SummarizerConfig) -> Result<(), SummarizerError> {
    info!(job_id = args.job_id, "Stopping job");
    let client = reqwest::Client::new();
    let base = args.server.clone().unwrap_or_else(|| config.server.base_url());
    let url = format!("{}/api/jobs/{}/stop", base.trim_end_matches('/'), args.job_id);

    let resp = api_request(&client, reqwest::Method::POST, &url, &config).send().await
        .map_err(|e| SummarizerError::Network(format!("Failed to stop job: {}", e)))?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        println!("Job {} is not running", args.job_id);
        return Ok(());
    }
    if !resp.status().is_success() {
        return Err(SummarizerError::Network(format!("Server returned {}", resp.status())));
    }

    println!("Stop signal sent for job {}", args.job_id);
    Ok(())
}
