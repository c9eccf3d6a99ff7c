use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::CatalogCache;
use crate::config::SummarizerConfig;
use crate::db::Database;
use crate::errors::SummarizerError;
use crate::summary::SeverityPolicy;
use super::orchestrator::SummarizerJob;
use super::publisher::{FanoutPublisher, JobResultPublisher, WebhookPublisher};
use super::state::{JobRequest, JobResult};

/// Runs summarizer jobs in the background, at most `max_concurrent_jobs`
/// at a time. Every job publishes to the job table plus any extra publishers.
#[derive(Clone)]
pub struct JobWorker {
    db: Database,
    catalog: Arc<CatalogCache>,
    publisher: FanoutPublisher,
    page_size: usize,
    severity_policy: SeverityPolicy,
    permits: Arc<Semaphore>,
    active_jobs: Arc<DashMap<u64, CancellationToken>>,
}

impl JobWorker {
    pub fn new(db: Database, catalog: Arc<CatalogCache>, config: &SummarizerConfig) -> Self {
        let mut publisher = FanoutPublisher::new().with(Arc::new(db.clone()));
        if let Some(url) = &config.webhook_url {
            publisher = publisher.with(Arc::new(WebhookPublisher::new(url)));
        }
        Self {
            db,
            catalog,
            publisher,
            page_size: config.page_size,
            severity_policy: config.severity_policy,
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
            active_jobs: Arc::new(DashMap::new()),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn JobResultPublisher>) -> Self {
        self.publisher = self.publisher.with(publisher);
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    /// Record a new CREATED job for `benchmark_id` and return its request.
    pub fn create_job(&self, benchmark_id: &str) -> Result<JobRequest, SummarizerError> {
        let created_at = Utc::now();
        let job_id = self.db.create_job_at(benchmark_id, created_at)?;
        Ok(JobRequest {
            job_id,
            benchmark_id: benchmark_id.to_string(),
            created_at,
        })
    }

    /// Create a job and run it in the background once a slot is free.
    pub fn submit(&self, benchmark_id: &str) -> Result<(u64, JoinHandle<JobResult>), SummarizerError> {
        let request = self.create_job(benchmark_id)?;
        let job_id = request.job_id;
        let cancel = CancellationToken::new();
        self.active_jobs.insert(job_id, cancel.clone());

        let worker = self.clone();
        let handle = tokio::spawn(async move {
            let result = match worker.permits.clone().acquire_owned().await {
                Ok(_permit) => worker.build_job(request, cancel).run().await,
                Err(_) => {
                    let err = SummarizerError::Internal("job worker shut down".into());
                    let result = JobResult::failed(&request, &err, 0, 0);
                    if let Err(e) = worker.publisher.publish(&result).await {
                        warn!(job_id, error = %e, "Failed to publish job result");
                    }
                    result
                }
            };
            worker.active_jobs.remove(&job_id);
            result
        });

        info!(job_id, benchmark_id = %benchmark_id, "Summarizer job queued");
        Ok((job_id, handle))
    }

    /// Run an already-created job on the current task.
    pub async fn run(&self, request: JobRequest, cancel: CancellationToken) -> JobResult {
        let job_id = request.job_id;
        self.active_jobs.insert(job_id, cancel.clone());
        let result = self.build_job(request, cancel).run().await;
        self.active_jobs.remove(&job_id);
        result
    }

    /// Signal a running or queued job to stop. Returns false if it is not active.
    pub fn stop(&self, job_id: u64) -> bool {
        match self.active_jobs.get(&job_id) {
            Some(token) => {
                token.cancel();
                info!(job_id, "Stop requested for summarizer job");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, job_id: u64) -> bool {
        self.active_jobs.contains_key(&job_id)
    }

    pub fn active_count(&self) -> usize {
        self.active_jobs.len()
    }

    /// Cancel every active job.
    pub fn shutdown(&self) {
        for entry in self.active_jobs.iter() {
            entry.value().cancel();
        }
        self.permits.close();
    }

    fn build_job(&self, request: JobRequest, cancel: CancellationToken) -> SummarizerJob {
        SummarizerJob::new(
            request,
            Arc::new(self.db.clone()),
            Arc::new(self.db.clone()),
            self.catalog.clone(),
            Arc::new(self.publisher.clone()),
        )
        .with_page_size(self.page_size)
        .with_severity_policy(self.severity_policy)
        .with_cancel_token(cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BenchmarkDefinition, ComplianceResult, ComplianceStatus, Severity};
    use crate::pipeline::publisher::ChannelPublisher;
    use crate::pipeline::state::JobStatus;
    use tokio::sync::mpsc;

    fn setup() -> JobWorker {
        let db = Database::in_memory().unwrap();
        let cis = BenchmarkDefinition {
            id: "cis".into(),
            title: "CIS".into(),
            parent_id: None,
            controls: vec![],
        };
        db.upsert_benchmark(&cis).unwrap();
        db.insert_results(&[ComplianceResult {
            control_id: "mfa".into(),
            benchmark_id: "cis".into(),
            parent_benchmarks: vec!["cis".into()],
            resource_type: "user".into(),
            platform_resource_id: "u1".into(),
            integration_id: "acct".into(),
            status: ComplianceStatus::Alarm,
            severity: Severity::High,
            cost_impact: None,
            resource_collections: vec![],
            evaluated_at: 1,
        }]).unwrap();

        let catalog = Arc::new(CatalogCache::from_definitions(vec![cis]));
        let config = SummarizerConfig { page_size: 10, max_concurrent_jobs: 2, ..Default::default() };
        JobWorker::new(db, catalog, &config)
    }

    #[tokio::test]
    async fn test_submit_runs_job_to_completion() {
        let worker = setup();
        let (job_id, handle) = worker.submit("cis").unwrap();
        let result = handle.await.unwrap();

        assert_eq!(result.status, JobStatus::Succeeded);
        assert_eq!(result.records_processed, 1);
        assert!(!worker.is_active(job_id));

        let job = worker.db().get_job(job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        let summary = worker.db().get_summary("cis", job_id).unwrap().unwrap();
        assert_eq!(summary.security_score, 0.0);
    }

    #[tokio::test]
    async fn test_submit_unknown_benchmark_fails_job() {
        let worker = setup();
        let (job_id, handle) = worker.submit("pci").unwrap();
        assert_eq!(handle.await.unwrap().status, JobStatus::Failed);
        let job = worker.db().get_job(job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_type.as_deref(), Some("UnknownBenchmarkError"));
    }

    #[tokio::test]
    async fn test_stopped_job_emits_no_summary() {
        let worker = setup();
        let request = worker.create_job("cis").unwrap();
        let job_id = request.job_id;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = worker.run(request, cancel).await;
        assert_eq!(result.status, JobStatus::Failed);
        assert!(worker.db().get_summary("cis", job_id).unwrap().is_none());
        assert_eq!(worker.db().get_job(job_id).unwrap().unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_extra_publisher_sees_both_updates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = setup().with_publisher(Arc::new(ChannelPublisher::new(tx)));
        let (_, handle) = worker.submit("cis").unwrap();
        handle.await.unwrap();

        assert_eq!(rx.recv().await.unwrap().status, JobStatus::InProgress);
        assert_eq!(rx.recv().await.unwrap().status, JobStatus::Succeeded);
    }

    #[test]
    fn test_stop_unknown_job() {
        let worker = setup();
        assert!(!worker.stop(999));
        assert_eq!(worker.active_count(), 0);
    }
}
