use crate::cli::api_request;
use crate::cli::commands::StatusArgs;
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use tracing::info;

pub async fn handle_status(args: StatusArgs, config: SummarizerConfig) -> Result<(), SummarizerError> {
    info!(job_id = args.job_id, "Querying job status");

    let client = reqwest::Client::new();
    let base = args.server.clone().unwrap_or_else(|| config.server.base_url());
    let url = format!("{}/api/jobs/{}", base.trim_end_matches('/'), args.job_id);

    loop {
        let resp = api_request(&client, reqwest::Method::GET, &url, &config).send().await
            .map_err(|e| SummarizerError::Network(format!("Failed to query job: {}", e)))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SummarizerError::Internal(format!("Job {} not found", args.job_id)));
        }
        if !resp.status().is_success() {
            return Err(SummarizerError::Network(format!("Server returned {}", resp.status())));
        }

        let job: serde_json::Value = resp.json().await
            .map_err(|e| SummarizerError::Network(format!("Invalid response: {}", e)))?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&job)?);
        } else {
            println!(
                "Job {}: {} ({} records)",
                args.job_id,
                job["status"].as_str().unwrap_or("unknown"),
                job["records_processed"].as_u64().unwrap_or(0),
            );
            if let Some(error) = job["error"].as_str() {
                println!("Error: {}", error);
            }
        }

        let status = job["status"].as_str().unwrap_or("");
        if !args.follow || status == "SUCCEEDED" || status == "FAILED" {
            break;
        }

        tokio::time::sleep(std::time::Duration::from_secs(args.interval.max(1))).await;
    }

    Ok(())
}
