use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unknown benchmark: {0}")]
    UnknownBenchmark(String),

    #[error("Job cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid job transition: {0}")]
    InvalidTransition(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for SummarizerError {
    fn from(e: rusqlite::Error) -> Self {
        SummarizerError::Database(e.to_string())
    }
}
