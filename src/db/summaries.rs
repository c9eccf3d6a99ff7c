use chrono::Utc;
use serde::Serialize;

use crate::errors::SummarizerError;
use crate::summary::BenchmarkSummary;
use super::{sql_id, Database};

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub benchmark_id: String,
    pub job_id: u64,
    pub evaluated_at_epoch: i64,
    pub security_score: f64,
    pub document: serde_json::Value,
    pub updated_at: String,
}

const SUMMARY_COLUMNS: &str = "benchmark_id, job_id, evaluated_at_epoch, security_score, document, updated_at";

fn summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<SummaryRecord> {
    let document: String = row.get(4)?;
    let document = serde_json::from_str(&document).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(SummaryRecord {
        benchmark_id: row.get(0)?,
        job_id: row.get::<_, i64>(1)? as u64,
        evaluated_at_epoch: row.get(2)?,
        security_score: row.get(3)?,
        document,
        updated_at: row.get(5)?,
    })
}

impl Database {
    /// Store a finalized summary, replacing any earlier document for the
    /// same `(benchmark_id, job_id)`.
    pub fn put_summary(&self, summary: &BenchmarkSummary) -> Result<(), SummarizerError> {
        let job_id = sql_id(summary.job_id)?;
        let document = summary.to_document()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO benchmark_summaries (benchmark_id, job_id, evaluated_at_epoch, security_score, document, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(benchmark_id, job_id) DO UPDATE SET
                evaluated_at_epoch = excluded.evaluated_at_epoch,
                security_score = excluded.security_score,
                document = excluded.document,
                updated_at = excluded.updated_at",
            rusqlite::params![
                summary.benchmark_id,
                job_id,
                summary.evaluated_at_epoch,
                summary.security_score(),
                document,
                Utc::now().to_rfc3339(),
            ],
        ).map_err(|e| SummarizerError::Database(format!("Failed to store summary: {}", e)))?;
        Ok(())
    }

    pub fn get_summary(&self, benchmark_id: &str, job_id: u64) -> Result<Option<SummaryRecord>, SummarizerError> {
        let Ok(job_id) = i64::try_from(job_id) else {
            return Ok(None);
        };
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM benchmark_summaries WHERE benchmark_id = ?1 AND job_id = ?2",
            SUMMARY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        match stmt.query_row(rusqlite::params![benchmark_id, job_id], summary_from_row) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SummarizerError::Database(format!("Query error: {}", e))),
        }
    }

    /// The summary with the highest job id for a benchmark.
    pub fn latest_summary(&self, benchmark_id: &str) -> Result<Option<SummaryRecord>, SummarizerError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM benchmark_summaries WHERE benchmark_id = ?1 ORDER BY job_id DESC LIMIT 1",
            SUMMARY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        match stmt.query_row(rusqlite::params![benchmark_id], summary_from_row) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SummarizerError::Database(format!("Query error: {}", e))),
        }
    }
}
