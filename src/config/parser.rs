use std::path::Path;
use crate::errors::SummarizerError;
use super::credentials::resolve_credential;
use super::types::SummarizerConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<SummarizerConfig, SummarizerError> {
    if !path.exists() {
        return Err(SummarizerError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(SummarizerError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse, validate and resolve a YAML config document.
pub fn parse_config_str(content: &str) -> Result<SummarizerConfig, SummarizerError> {
    // An empty file is a valid all-defaults config.
    if content.trim().is_empty() {
        return Ok(SummarizerConfig::default());
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    // JSON Schema validation
    validate_schema(&yaml)?;

    // Parse into typed config
    let mut config: SummarizerConfig = serde_yaml::from_value(yaml)?;

    config.webhook_url = config.webhook_url.as_deref().map(resolve_credential);
    config.api_token = config.api_token.as_deref().map(resolve_credential);

    validate_semantics(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), SummarizerError> {
    // Convert YAML value to JSON for schema validation
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| SummarizerError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| SummarizerError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| SummarizerError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory: typed parsing and semantic checks decide validity.
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

fn validate_semantics(config: &SummarizerConfig) -> Result<(), SummarizerError> {
    if config.page_size == 0 {
        return Err(SummarizerError::Config("page_size must be greater than 0".into()));
    }
    if config.max_concurrent_jobs == 0 {
        return Err(SummarizerError::Config("max_concurrent_jobs must be greater than 0".into()));
    }
    if config.database.trim().is_empty() {
        return Err(SummarizerError::Config("database path must not be empty".into()));
    }

    if let Some(url) = &config.webhook_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SummarizerError::Config(format!(
                "webhook_url must use http or https: '{}'",
                url
            )));
        }
    }

    if config.catalog_refresh_secs == 0 {
        warn!("catalog_refresh_secs is 0; benchmark catalog refreshes only on import");
    }

    Ok(())
}
