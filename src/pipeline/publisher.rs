use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::credentials::redact_credentials;
use crate::db::Database;
use crate::errors::SummarizerError;
use super::state::JobResult;

/// Destination for job status updates. Failures are reported to the caller,
/// which logs them; they never fail the job.
#[async_trait]
pub trait JobResultPublisher: Send + Sync {
    async fn publish(&self, result: &JobResult) -> Result<(), SummarizerError>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Job bookkeeping in the `jobs` table.
#[async_trait]
impl JobResultPublisher for Database {
    async fn publish(&self, result: &JobResult) -> Result<(), SummarizerError> {
        let db = self.clone();
        let result = result.clone();
        tokio::task::spawn_blocking(move || db.record_job_result(&result))
            .await
            .map_err(|e| SummarizerError::Internal(format!("Database task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "database"
    }
}

/// Forwards results to an in-process consumer.
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<JobResult>,
}

impl ChannelPublisher {
    pub fn new(tx: mpsc::UnboundedSender<JobResult>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl JobResultPublisher for ChannelPublisher {
    async fn publish(&self, result: &JobResult) -> Result<(), SummarizerError> {
        self.tx
            .send(result.clone())
            .map_err(|_| SummarizerError::Internal("Job result receiver dropped".into()))
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// POSTs each result as JSON to a fixed URL.
pub struct WebhookPublisher {
    client: Client,
    url: String,
}

impl WebhookPublisher {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// The URL may embed a token, so it never reaches logs or job errors.
    fn redact(&self, message: &str) -> String {
        redact_credentials(message, &[self.url.as_str()])
    }
}

#[async_trait]
impl JobResultPublisher for WebhookPublisher {
    async fn publish(&self, result: &JobResult) -> Result<(), SummarizerError> {
        let resp = self.client
            .post(&self.url)
            .json(result)
            .send()
            .await
            .map_err(|e| SummarizerError::Network(self.redact(&format!("Webhook request failed: {}", e))))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SummarizerError::Network(format!("Webhook returned {}", status)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// Publishes to every inner publisher in order. A failing publisher is
/// logged and does not stop the rest.
#[derive(Default, Clone)]
pub struct FanoutPublisher {
    publishers: Vec<Arc<dyn JobResultPublisher>>,
}

impl FanoutPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, publisher: Arc<dyn JobResultPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

#[async_trait]
impl JobResultPublisher for FanoutPublisher {
    async fn publish(&self, result: &JobResult) -> Result<(), SummarizerError> {
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(result).await {
                warn!(
                    job_id = result.job_id,
                    publisher = publisher.name(),
                    status = %result.status,
                    error = %e,
                    "Failed to publish job result"
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fanout"
    }
}
