use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::errors::{ErrorClassification, SummarizerError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Created,
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::InProgress => "IN_PROGRESS",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "IN_PROGRESS" => Some(Self::InProgress),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// CREATED → IN_PROGRESS → {SUCCEEDED | FAILED}. A job may also fail
    /// before it starts, e.g. for an unknown benchmark.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::InProgress)
                | (Self::Created, Self::Failed)
                | (Self::InProgress, Self::Succeeded)
                | (Self::InProgress, Self::Failed)
        )
    }

    pub fn transition(self, next: JobStatus) -> Result<JobStatus, SummarizerError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SummarizerError::InvalidTransition(format!("{} -> {}", self, next)))
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One summarization run for one benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: u64,
    pub benchmark_id: String,
    pub created_at: DateTime<Utc>,
}

impl JobRequest {
    pub fn new(job_id: u64, benchmark_id: &str) -> Self {
        Self {
            job_id,
            benchmark_id: benchmark_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Status update emitted to every [`JobResultPublisher`](super::publisher::JobResultPublisher).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobResult {
    pub job_id: u64,
    pub benchmark_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub retryable: bool,
    pub records_processed: u64,
    pub pages_processed: u64,
}

impl JobResult {
    pub fn status(request: &JobRequest, status: JobStatus) -> Self {
        Self {
            job_id: request.job_id,
            benchmark_id: request.benchmark_id.clone(),
            status,
            error: None,
            error_type: None,
            retryable: false,
            records_processed: 0,
            pages_processed: 0,
        }
    }

    pub fn succeeded(request: &JobRequest, records: u64, pages: u64) -> Self {
        Self {
            records_processed: records,
            pages_processed: pages,
            ..Self::status(request, JobStatus::Succeeded)
        }
    }

    pub fn failed(request: &JobRequest, err: &SummarizerError, records: u64, pages: u64) -> Self {
        let ErrorClassification { error_type, retryable } = err.classify();
        Self {
            error: Some(err.to_string()),
            error_type: Some(error_type.to_string()),
            retryable,
            records_processed: records,
            pages_processed: pages,
            ..Self::status(request, JobStatus::Failed)
        }
    }

    /// Rebuild the failure as an error, for callers that surface it directly.
    pub fn to_error(&self) -> Option<SummarizerError> {
        if self.status != JobStatus::Failed {
            return None;
        }
        let message = self.error.clone().unwrap_or_default();
        Some(match self.error_type.as_deref() {
            Some("UnknownBenchmarkError") => SummarizerError::UnknownBenchmark(self.benchmark_id.clone()),
            Some("CancelledError") => SummarizerError::Cancelled(message),
            Some("DatabaseError") => SummarizerError::Database(message),
            Some("DecodeError") => SummarizerError::Decode(message),
            Some("NetworkError") => SummarizerError::Network(message),
            _ => SummarizerError::Internal(message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(JobStatus::Created.can_transition_to(JobStatus::InProgress));
        assert!(JobStatus::Created.can_transition_to(JobStatus::Failed));
        assert!(JobStatus::InProgress.can_transition_to(JobStatus::Succeeded));
        assert!(JobStatus::InProgress.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!JobStatus::Created.can_transition_to(JobStatus::Succeeded));
        assert!(!JobStatus::Succeeded.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::InProgress));
        assert!(!JobStatus::InProgress.can_transition_to(JobStatus::Created));

        let err = JobStatus::Succeeded.transition(JobStatus::InProgress).unwrap_err();
        assert!(matches!(err, SummarizerError::InvalidTransition(_)));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(JobStatus::parse("SUCCEEDED"), Some(JobStatus::Succeeded));
        assert_eq!(JobStatus::parse("done"), None);
    }

    #[test]
    fn test_failed_result_carries_classification() {
        let request = JobRequest::new(9, "cis");
        let result = JobResult::failed(&request, &SummarizerError::Database("locked".into()), 10, 1);
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.error_type.as_deref(), Some("DatabaseError"));
        assert!(result.retryable);
        assert!(result.error.as_deref().unwrap().contains("locked"));
        assert!(matches!(result.to_error(), Some(SummarizerError::Database(_))));
    }

    #[test]
    fn test_succeeded_result_has_no_error() {
        let request = JobRequest::new(1, "cis");
        assert!(JobResult::succeeded(&request, 1, 1).to_error().is_none());
    }
}
