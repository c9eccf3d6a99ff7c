pub mod commands;
pub mod serve;
pub mod summarize;
pub mod ingest;
pub mod benchmarks;
pub mod report;
pub mod status;
pub mod stop;

pub use commands::{Cli, Commands};

use std::path::Path;
use std::time::Duration;
use indicatif::{ProgressBar, ProgressStyle};
use crate::config::{parse_config, SummarizerConfig};
use crate::db::Database;
use crate::errors::SummarizerError;

/// Load the config file if one was given, otherwise defaults.
pub async fn load_config(path: Option<&str>) -> Result<SummarizerConfig, SummarizerError> {
    match path {
        Some(p) => parse_config(Path::new(p)).await,
        None => Ok(SummarizerConfig::default()),
    }
}

pub fn open_database(config: &SummarizerConfig, override_path: Option<&str>) -> Result<Database, SummarizerError> {
    Database::new(override_path.unwrap_or(&config.database))
}

/// Spinner on stderr; hidden when `quiet`.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Client for a running server, carrying the bearer token when configured.
pub(crate) fn api_request(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    config: &SummarizerConfig,
) -> reqwest::RequestBuilder {
    let token = config
        .api_token
        .clone()
        .or_else(|| std::env::var(crate::api::auth::API_TOKEN_ENV).ok())
        .filter(|t| !t.is_empty());
    let builder = client.request(method, url);
    match token {
        Some(t) => builder.bearer_auth(t),
        None => builder,
    }
}
