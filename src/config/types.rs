use serde::{Deserialize, Serialize};

use crate::summary::SeverityPolicy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    /// Path to the SQLite store.
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    #[serde(default)]
    pub severity_policy: SeverityPolicy,
    /// Seconds between catalog reloads while serving. 0 disables the refresher.
    #[serde(default = "default_catalog_refresh_secs")]
    pub catalog_refresh_secs: u64,
    /// Job results are POSTed here when set. `$VAR` reads the environment.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Bearer token for the HTTP API. `$VAR` reads the environment.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_database() -> String {
    "benchsum.db".to_string()
}

fn default_page_size() -> usize {
    1000
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_catalog_refresh_secs() -> u64 {
    300
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            page_size: default_page_size(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            severity_policy: SeverityPolicy::default(),
            catalog_refresh_secs: default_catalog_refresh_secs(),
            webhook_url: None,
            api_token: None,
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
