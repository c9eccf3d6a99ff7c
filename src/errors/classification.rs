use super::types::SummarizerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl SummarizerError {
    /// Classify this error so a scheduler can decide whether re-running the
    /// job could succeed. Nothing in this crate retries on its own.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient: the same job may succeed on a later run
            SummarizerError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                retryable: true,
            },
            SummarizerError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            SummarizerError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: true,
            },

            // Permanent for this input
            SummarizerError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            SummarizerError::Decode(_) => ErrorClassification {
                error_type: "DecodeError",
                retryable: false,
            },
            SummarizerError::UnknownBenchmark(_) => ErrorClassification {
                error_type: "UnknownBenchmarkError",
                retryable: false,
            },
            SummarizerError::Cancelled(_) => ErrorClassification {
                error_type: "CancelledError",
                retryable: false,
            },
            SummarizerError::InvalidTransition(_) => ErrorClassification {
                error_type: "InvalidTransitionError",
                retryable: false,
            },
            SummarizerError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            SummarizerError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            SummarizerError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            SummarizerError::Config(_) => 2,
            SummarizerError::Database(_) => 3,
            SummarizerError::UnknownBenchmark(_) => 4,
            SummarizerError::Decode(_) => 5,
            SummarizerError::Cancelled(_) => 130,
            _ => 1,
        }
    }
}
