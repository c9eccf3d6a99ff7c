use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::BenchmarkCatalog;
use crate::errors::SummarizerError;
use crate::summary::{BenchmarkSummary, SeverityPolicy};
use super::publisher::JobResultPublisher;
use super::source::{ResultPaginator, ResultSource, SummarySink};
use super::state::{JobRequest, JobResult, JobStatus};

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Progress of one run, reported in the final job result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobProgress {
    pub records: u64,
    pub pages: u64,
}

/// Pages through every result of one benchmark, folds them into a fresh
/// [`BenchmarkSummary`] and hands the finalized summary to the sink.
///
/// A summary is emitted only when every page was read; cancellation or any
/// source or sink failure ends the job FAILED without output.
pub struct SummarizerJob {
    request: JobRequest,
    source: Arc<dyn ResultSource>,
    sink: Arc<dyn SummarySink>,
    catalog: Arc<dyn BenchmarkCatalog>,
    publisher: Arc<dyn JobResultPublisher>,
    page_size: usize,
    severity_policy: SeverityPolicy,
    cancel_token: CancellationToken,
    status: JobStatus,
}

impl SummarizerJob {
    pub fn new(
        request: JobRequest,
        source: Arc<dyn ResultSource>,
        sink: Arc<dyn SummarySink>,
        catalog: Arc<dyn BenchmarkCatalog>,
        publisher: Arc<dyn JobResultPublisher>,
    ) -> Self {
        Self {
            request,
            source,
            sink,
            catalog,
            publisher,
            page_size: DEFAULT_PAGE_SIZE,
            severity_policy: SeverityPolicy::default(),
            cancel_token: CancellationToken::new(),
            status: JobStatus::Created,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_severity_policy(mut self, policy: SeverityPolicy) -> Self {
        self.severity_policy = policy;
        self
    }

    /// Replace the job's cancel token with an external one so the owner can stop it.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Run the job to a terminal state and return the final published result.
    pub async fn run(mut self) -> JobResult {
        let job_id = self.request.job_id;
        let benchmark_id = self.request.benchmark_id.clone();
        info!(job_id, benchmark_id = %benchmark_id, "Summarizer job started");

        if !self.catalog.contains(&benchmark_id) {
            let err = SummarizerError::UnknownBenchmark(benchmark_id.clone());
            error!(job_id, benchmark_id = %benchmark_id, "Benchmark not in catalog");
            return self.finish(Err((err, JobProgress::default()))).await;
        }

        if let Err(e) = self.advance(JobStatus::InProgress) {
            return self.finish(Err((e, JobProgress::default()))).await;
        }
        self.publish(JobResult::status(&self.request, JobStatus::InProgress)).await;

        let outcome = self.summarize_all().await;
        self.finish(outcome).await
    }

    async fn summarize_all(&self) -> Result<JobProgress, (SummarizerError, JobProgress)> {
        let mut progress = JobProgress::default();
        let mut summary = BenchmarkSummary::new(
            &self.request.benchmark_id,
            self.request.job_id,
            self.request.created_at.timestamp(),
        )
        .with_severity_policy(self.severity_policy);

        let mut paginator = ResultPaginator::new(
            self.source.as_ref(),
            &self.request.benchmark_id,
            self.page_size,
        );

        while paginator.has_next() {
            self.check_cancelled().map_err(|e| (e, progress))?;

            let page = paginator.next_page().await.map_err(|e| (e, progress))?;
            progress.pages = paginator.pages_fetched();
            // The token may fire while a fetch is in flight.
            self.check_cancelled().map_err(|e| (e, progress))?;
            for record in &page {
                summary.add_compliance_result(record);
            }
            progress.records += page.len() as u64;
            debug!(
                job_id = self.request.job_id,
                page = progress.pages,
                records = page.len(),
                "Folded result page"
            );
        }

        self.check_cancelled().map_err(|e| (e, progress))?;
        summary.summarize();
        self.sink.put_summary(&summary).await.map_err(|e| (e, progress))?;

        info!(
            job_id = self.request.job_id,
            benchmark_id = %self.request.benchmark_id,
            records = progress.records,
            pages = progress.pages,
            security_score = summary.security_score(),
            "Benchmark summary stored"
        );
        Ok(progress)
    }

    async fn finish(&mut self, outcome: Result<JobProgress, (SummarizerError, JobProgress)>) -> JobResult {
        let result = match outcome {
            Ok(progress) => JobResult::succeeded(&self.request, progress.records, progress.pages),
            Err((err, progress)) => {
                warn!(
                    job_id = self.request.job_id,
                    benchmark_id = %self.request.benchmark_id,
                    error = %err,
                    "Summarizer job failed"
                );
                JobResult::failed(&self.request, &err, progress.records, progress.pages)
            }
        };

        if let Err(e) = self.advance(result.status) {
            error!(job_id = self.request.job_id, error = %e, "Job ended in an invalid state");
        }
        self.publish(result.clone()).await;
        result
    }

    fn advance(&mut self, next: JobStatus) -> Result<(), SummarizerError> {
        self.status = self.status.transition(next)?;
        Ok(())
    }

    async fn publish(&self, result: JobResult) {
        if let Err(e) = self.publisher.publish(&result).await {
            warn!(
                job_id = result.job_id,
                publisher = self.publisher.name(),
                error = %e,
                "Failed to publish job result"
            );
        }
    }

    fn check_cancelled(&self) -> Result<(), SummarizerError> {
        if self.cancel_token.is_cancelled() {
            info!(job_id = self.request.job_id, "Summarizer job cancelled");
            Err(SummarizerError::Cancelled(format!("job {} stopped", self.request.job_id)))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;
    use crate::catalog::CatalogCache;
    use crate::models::{BenchmarkDefinition, ComplianceResult, ComplianceStatus, Severity};
    use crate::pipeline::publisher::ChannelPublisher;
    use crate::pipeline::source::ResultPage;

    /// Serves fixed pages; the cursor is the index of the next page.
    struct PagedSource {
        pages: Vec<Vec<ComplianceResult>>,
        fail_on: Option<usize>,
        cancel_after_first: Option<CancellationToken>,
    }

    #[async_trait]
    impl ResultSource for PagedSource {
        async fn fetch_page(
            &self,
            _benchmark_id: &str,
            cursor: Option<String>,
            _page_size: usize,
        ) -> Result<ResultPage, SummarizerError> {
            let idx: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            if self.fail_on == Some(idx) {
                return Err(SummarizerError::Database("connection reset".into()));
            }
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            let next = idx + 1;
            Ok(ResultPage {
                records: self.pages.get(idx).cloned().unwrap_or_default(),
                next_cursor: (next < self.pages.len()).then(|| next.to_string()),
            })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        summaries: Mutex<Vec<BenchmarkSummary>>,
    }

    #[async_trait]
    impl SummarySink for MemorySink {
        async fn put_summary(&self, summary: &BenchmarkSummary) -> Result<(), SummarizerError> {
            self.summaries.lock().unwrap().push(summary.clone());
            Ok(())
        }
    }

    fn record(control: &str, resource: &str, conn: &str, status: ComplianceStatus, severity: Severity) -> ComplianceResult {
        ComplianceResult {
            control_id: control.into(),
            benchmark_id: "B1".into(),
            parent_benchmarks: vec!["B1".into()],
            resource_type: "aws::ec2::instance".into(),
            platform_resource_id: resource.into(),
            integration_id: conn.into(),
            status,
            severity,
            cost_impact: None,
            resource_collections: vec![],
            evaluated_at: 0,
        }
    }

    fn catalog() -> Arc<dyn BenchmarkCatalog> {
        Arc::new(CatalogCache::from_definitions(vec![BenchmarkDefinition {
            id: "B1".into(),
            title: "Bench one".into(),
            parent_id: None,
            controls: vec!["C1".into(), "C2".into()],
        }]))
    }

    fn job(
        benchmark: &str,
        source: PagedSource,
        sink: Arc<MemorySink>,
    ) -> (SummarizerJob, mpsc::UnboundedReceiver<JobResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let request = JobRequest {
            job_id: 42,
            benchmark_id: benchmark.to_string(),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        let job = SummarizerJob::new(
            request,
            Arc::new(source),
            sink,
            catalog(),
            Arc::new(ChannelPublisher::new(tx)),
        );
        (job, rx)
    }

    fn scenario_pages() -> Vec<Vec<ComplianceResult>> {
        vec![
            vec![
                record("C1", "R1", "A", ComplianceStatus::Ok, Severity::None),
                record("C1", "R2", "A", ComplianceStatus::Alarm, Severity::High),
            ],
            vec![record("C2", "R1", "B", ComplianceStatus::Error, Severity::Medium)],
        ]
    }

    #[tokio::test]
    async fn test_job_summarizes_all_pages() {
        let sink = Arc::new(MemorySink::default());
        let source = PagedSource { pages: scenario_pages(), fail_on: None, cancel_after_first: None };
        let (job, mut rx) = job("B1", source, sink.clone());

        let result = job.run().await;
        assert_eq!(result.status, JobStatus::Succeeded);
        assert_eq!(result.records_processed, 3);
        assert_eq!(result.pages_processed, 2);

        assert_eq!(rx.recv().await.unwrap().status, JobStatus::InProgress);
        assert_eq!(rx.recv().await.unwrap().status, JobStatus::Succeeded);

        let stored = sink.summaries.lock().unwrap();
        assert_eq!(stored.len(), 1);
        let summary = &stored[0];
        assert_eq!(summary.job_id, 42);
        assert_eq!(summary.evaluated_at_epoch, 1_700_000_000);
        assert!((summary.security_score() - 33.333).abs() < 0.01);
        let c1 = &summary.connections.benchmark.controls["C1"];
        assert!(!c1.passed);
        assert_eq!(c1.total_resources_count, 2);
        assert_eq!(c1.failed_resources_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_benchmark_fails_without_summary() {
        let sink = Arc::new(MemorySink::default());
        let source = PagedSource { pages: scenario_pages(), fail_on: None, cancel_after_first: None };
        let (job, mut rx) = job("nope", source, sink.clone());

        let result = job.run().await;
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.error_type.as_deref(), Some("UnknownBenchmarkError"));
        assert!(!result.retryable);
        assert_eq!(rx.recv().await.unwrap().status, JobStatus::Failed);
        assert!(sink.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_emits_no_summary() {
        let sink = Arc::new(MemorySink::default());
        let source = PagedSource { pages: scenario_pages(), fail_on: Some(1), cancel_after_first: None };
        let (job, _rx) = job("B1", source, sink.clone());

        let result = job.run().await;
        assert_eq!(result.status, JobStatus::Failed);
        assert!(result.retryable);
        assert_eq!(result.records_processed, 2);
        assert!(result.error.unwrap().contains("connection reset"));
        assert!(sink.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_between_pages() {
        let sink = Arc::new(MemorySink::default());
        let token = CancellationToken::new();
        let source = PagedSource {
            pages: scenario_pages(),
            fail_on: None,
            cancel_after_first: Some(token.clone()),
        };
        let (job, _rx) = job("B1", source, sink.clone());

        let result = job.with_cancel_token(token).run().await;
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.error_type.as_deref(), Some("CancelledError"));
        assert_eq!(result.pages_processed, 1);
        assert!(sink.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_during_last_page_emits_no_summary() {
        let sink = Arc::new(MemorySink::default());
        let token = CancellationToken::new();
        let source = PagedSource {
            pages: vec![scenario_pages().concat()],
            fail_on: None,
            cancel_after_first: Some(token.clone()),
        };
        let (job, mut rx) = job("B1", source, sink.clone());

        let result = job.with_cancel_token(token.clone()).run().await;
        assert!(token.is_cancelled());
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.error_type.as_deref(), Some("CancelledError"));
        assert_eq!(result.pages_processed, 1);
        assert_eq!(result.records_processed, 0);
        assert!(sink.summaries.lock().unwrap().is_empty());

        assert_eq!(rx.recv().await.unwrap().status, JobStatus::InProgress);
        assert_eq!(rx.recv().await.unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_rerun_produces_identical_summary() {
        let sink = Arc::new(MemorySink::default());
        for _ in 0..2 {
            let source = PagedSource { pages: scenario_pages(), fail_on: None, cancel_after_first: None };
            let (job, _rx) = job("B1", source, sink.clone());
            assert_eq!(job.run().await.status, JobStatus::Succeeded);
        }
        let stored = sink.summaries.lock().unwrap();
        assert_eq!(stored[0].to_document().unwrap(), stored[1].to_document().unwrap());
    }
}
