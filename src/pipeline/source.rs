use async_trait::async_trait;

use crate::db::Database;
use crate::errors::SummarizerError;
use crate::models::ComplianceResult;
use crate::summary::BenchmarkSummary;

/// One page of results and the opaque cursor for the next page, if any.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub records: Vec<ComplianceResult>,
    pub next_cursor: Option<String>,
}

/// Pages through every result indexed under a benchmark.
#[async_trait]
pub trait ResultSource: Send + Sync {
    async fn fetch_page(
        &self,
        benchmark_id: &str,
        cursor: Option<String>,
        page_size: usize,
    ) -> Result<ResultPage, SummarizerError>;
}

/// Receives finalized summaries, keyed by `(benchmark_id, job_id)`.
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn put_summary(&self, summary: &BenchmarkSummary) -> Result<(), SummarizerError>;
}

fn parse_cursor(cursor: Option<String>) -> Result<i64, SummarizerError> {
    match cursor {
        None => Ok(0),
        Some(c) => c
            .parse::<i64>()
            .map_err(|_| SummarizerError::Decode(format!("invalid result cursor '{}'", c))),
    }
}

async fn blocking<T, F>(f: F) -> Result<T, SummarizerError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SummarizerError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SummarizerError::Internal(format!("Database task failed: {}", e)))?
}

#[async_trait]
impl ResultSource for Database {
    async fn fetch_page(
        &self,
        benchmark_id: &str,
        cursor: Option<String>,
        page_size: usize,
    ) -> Result<ResultPage, SummarizerError> {
        let after = parse_cursor(cursor)?;
        let db = self.clone();
        let benchmark_id = benchmark_id.to_string();
        let rows = blocking(move || db.fetch_results_page(&benchmark_id, after, page_size)).await?;

        // A short page means the keyset is exhausted.
        let next_cursor = if rows.records.len() < page_size {
            None
        } else {
            rows.last_row.map(|row| row.to_string())
        };
        Ok(ResultPage { records: rows.records, next_cursor })
    }
}

#[async_trait]
impl SummarySink for Database {
    async fn put_summary(&self, summary: &BenchmarkSummary) -> Result<(), SummarizerError> {
        let db = self.clone();
        let summary = summary.clone();
        blocking(move || Database::put_summary(&db, &summary)).await
    }
}

/// Drives a [`ResultSource`] page by page until it reports no next cursor.
pub struct ResultPaginator<'a> {
    source: &'a dyn ResultSource,
    benchmark_id: String,
    page_size: usize,
    cursor: Option<String>,
    exhausted: bool,
    pages: u64,
}

impl<'a> ResultPaginator<'a> {
    pub fn new(source: &'a dyn ResultSource, benchmark_id: &str, page_size: usize) -> Self {
        Self {
            source,
            benchmark_id: benchmark_id.to_string(),
            page_size: page_size.max(1),
            cursor: None,
            exhausted: false,
            pages: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        !self.exhausted
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages
    }

    pub async fn next_page(&mut self) -> Result<Vec<ComplianceResult>, SummarizerError> {
        if self.exhausted {
            return Ok(Vec::new());
        }
        let page = self
            .source
            .fetch_page(&self.benchmark_id, self.cursor.take(), self.page_size)
            .await?;
        self.pages += 1;
        match page.next_cursor {
            Some(next) => self.cursor = Some(next),
            None => self.exhausted = true,
        }
        Ok(page.records)
    }
}
