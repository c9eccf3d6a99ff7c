use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::SummarizerError;
use crate::pipeline::state::{JobResult, JobStatus};
use super::{sql_id, Database};

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: u64,
    pub benchmark_id: String,
    pub status: JobStatus,
    pub error: Option<String>,
    pub error_type: Option<String>,
    pub records_processed: u64,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

const JOB_COLUMNS: &str =
    "id, benchmark_id, status, error_message, error_type, records_processed, created_at, started_at, completed_at";

fn job_from_row(row: &rusqlite::Row) -> rusqlite::Result<JobRecord> {
    let status: String = row.get(2)?;
    let status = JobStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown job status '{}'", status).into(),
        )
    })?;
    Ok(JobRecord {
        id: row.get::<_, i64>(0)? as u64,
        benchmark_id: row.get(1)?,
        status,
        error: row.get(3)?,
        error_type: row.get(4)?,
        records_processed: row.get::<_, i64>(5)? as u64,
        created_at: row.get(6)?,
        started_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

impl Database {
    pub fn create_job(&self, benchmark_id: &str) -> Result<u64, SummarizerError> {
        self.create_job_at(benchmark_id, Utc::now())
    }

    pub fn create_job_at(&self, benchmark_id: &str, created_at: DateTime<Utc>) -> Result<u64, SummarizerError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO jobs (benchmark_id, status, created_at) VALUES (?1, 'CREATED', ?2)",
            rusqlite::params![benchmark_id, created_at.to_rfc3339()],
        ).map_err(|e| SummarizerError::Database(format!("Failed to create job: {}", e)))?;
        Ok(conn.last_insert_rowid() as u64)
    }

    /// Create or reset job `id` to CREATED so it can run again. Used when the
    /// caller assigns job ids itself.
    pub fn register_job(&self, id: u64, benchmark_id: &str, created_at: DateTime<Utc>) -> Result<(), SummarizerError> {
        let id = sql_id(id)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO jobs (id, benchmark_id, status, created_at) VALUES (?1, ?2, 'CREATED', ?3)
             ON CONFLICT(id) DO UPDATE SET benchmark_id = excluded.benchmark_id, status = 'CREATED',
                error_message = NULL, error_type = NULL, records_processed = 0,
                created_at = excluded.created_at, started_at = NULL, completed_at = NULL",
            rusqlite::params![id, benchmark_id, created_at.to_rfc3339()],
        ).map_err(|e| SummarizerError::Database(format!("Failed to register job: {}", e)))?;
        Ok(())
    }

    /// Apply a published job result. The stored status must be able to move
    /// to the new one; re-publishing the current status is a no-op.
    pub fn record_job_result(&self, result: &JobResult) -> Result<(), SummarizerError> {
        let job_id = sql_id(result.job_id)?;
        let conn = self.lock()?;
        let current: Option<String> = match conn.query_row(
            "SELECT status FROM jobs WHERE id = ?1",
            rusqlite::params![job_id],
            |row| row.get(0),
        ) {
            Ok(s) => Some(s),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(SummarizerError::Database(format!("Query error: {}", e))),
        };
        let Some(current) = current.as_deref().and_then(JobStatus::parse) else {
            return Err(SummarizerError::Database(format!("Job {} not found", result.job_id)));
        };
        if current == result.status {
            return Ok(());
        }
        current.transition(result.status)?;

        let now = Utc::now().to_rfc3339();
        let sql = match result.status {
            JobStatus::Succeeded | JobStatus::Failed => {
                "UPDATE jobs SET status = ?2, records_processed = ?3, error_message = ?4, error_type = ?5, completed_at = ?6 WHERE id = ?1"
            }
            JobStatus::Created | JobStatus::InProgress => {
                "UPDATE jobs SET status = ?2, records_processed = ?3, error_message = ?4, error_type = ?5, started_at = ?6 WHERE id = ?1"
            }
        };
        conn.execute(
            sql,
            rusqlite::params![
                job_id,
                result.status.as_str(),
                result.records_processed as i64,
                result.error,
                result.error_type,
                now,
            ],
        ).map_err(|e| SummarizerError::Database(format!("Update failed: {}", e)))?;
        Ok(())
    }

    pub fn get_job(&self, id: u64) -> Result<Option<JobRecord>, SummarizerError> {
        let Ok(id) = i64::try_from(id) else {
            return Ok(None);
        };
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS);
        let mut stmt = conn.prepare(&sql)
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        match stmt.query_row(rusqlite::params![id], job_from_row) {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SummarizerError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn list_jobs(&self, limit: usize, offset: usize) -> Result<Vec<JobRecord>, SummarizerError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM jobs ORDER BY id DESC LIMIT ?1 OFFSET ?2", JOB_COLUMNS);
        let mut stmt = conn.prepare(&sql)
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(rusqlite::params![limit as i64, offset as i64], job_from_row)
            .map_err(|e| SummarizerError::Database(format!("Query error: {}", e)))?;

        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row.map_err(|e| SummarizerError::Database(format!("Row error: {}", e)))?);
        }
        Ok(jobs)
    }

    /// Fail every job left unfinished by a previous process. Returns how
    /// many were marked.
    pub fn fail_interrupted_jobs(&self) -> Result<usize, SummarizerError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE jobs SET status = 'FAILED', error_message = 'interrupted by shutdown', error_type = 'CancelledError', completed_at = ?1 WHERE status IN ('CREATED', 'IN_PROGRESS')",
            rusqlite::params![Utc::now().to_rfc3339()],
        ).map_err(|e| SummarizerError::Database(format!("Update failed: {}", e)))?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::JobRequest;

    #[test]
    fn test_db_create_and_get_job() {
        let db = Database::in_memory().unwrap();
        let id = db.create_job("cis").unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.benchmark_id, "cis");
        assert_eq!(job.status, JobStatus::Created);
        assert!(job.started_at.is_none());
        assert!(db.get_job(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_db_job_ids_increase() {
        let db = Database::in_memory().unwrap();
        let a = db.create_job("cis").unwrap();
        let b = db.create_job("cis").unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_db_record_job_lifecycle() {
        let db = Database::in_memory().unwrap();
        let id = db.create_job("cis").unwrap();
        let request = JobRequest::new(id, "cis");

        db.record_job_result(&JobResult::status(&request, JobStatus::InProgress)).unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(job.started_at.is_some());

        db.record_job_result(&JobResult::succeeded(&request, 120, 2)).unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.records_processed, 120);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_db_rejects_invalid_transition() {
        let db = Database::in_memory().unwrap();
        let id = db.create_job("cis").unwrap();
        let request = JobRequest::new(id, "cis");

        let err = db.record_job_result(&JobResult::succeeded(&request, 0, 0)).unwrap_err();
        assert!(matches!(err, SummarizerError::InvalidTransition(_)));
        assert_eq!(db.get_job(id).unwrap().unwrap().status, JobStatus::Created);
    }

    #[test]
    fn test_db_failed_job_keeps_error() {
        let db = Database::in_memory().unwrap();
        let id = db.create_job("nope").unwrap();
        let request = JobRequest::new(id, "nope");
        let err = SummarizerError::UnknownBenchmark("nope".into());
        db.record_job_result(&JobResult::failed(&request, &err, 0, 0)).unwrap();

        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_type.as_deref(), Some("UnknownBenchmarkError"));
        assert!(job.error.unwrap().contains("nope"));
    }

    #[test]
    fn test_db_list_jobs_newest_first() {
        let db = Database::in_memory().unwrap();
        db.create_job("a").unwrap();
        db.create_job("b").unwrap();
        db.create_job("c").unwrap();

        let jobs = db.list_jobs(2, 0).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].benchmark_id, "c");
        assert_eq!(db.list_jobs(10, 2).unwrap()[0].benchmark_id, "a");
    }

    #[test]
    fn test_db_register_job_resets_state() {
        let db = Database::in_memory().unwrap();
        db.register_job(42, "cis", Utc::now()).unwrap();
        let request = JobRequest::new(42, "cis");
        db.record_job_result(&JobResult::status(&request, JobStatus::InProgress)).unwrap();
        db.record_job_result(&JobResult::succeeded(&request, 9, 1)).unwrap();

        db.register_job(42, "cis", Utc::now()).unwrap();
        let job = db.get_job(42).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Created);
        assert_eq!(job.records_processed, 0);
        assert!(job.completed_at.is_none());
        assert!(db.create_job("cis").unwrap() > 42);
    }

    #[test]
    fn test_db_fail_interrupted_jobs() {
        let db = Database::in_memory().unwrap();
        let running = db.create_job("a").unwrap();
        db.record_job_result(&JobResult::status(&JobRequest::new(running, "a"), JobStatus::InProgress)).unwrap();
        let done = db.create_job("b").unwrap();
        let request = JobRequest::new(done, "b");
        db.record_job_result(&JobResult::status(&request, JobStatus::InProgress)).unwrap();
        db.record_job_result(&JobResult::succeeded(&request, 1, 1)).unwrap();

        assert_eq!(db.fail_interrupted_jobs().unwrap(), 1);
        assert_eq!(db.get_job(running).unwrap().unwrap().status, JobStatus::Failed);
        assert_eq!(db.get_job(done).unwrap().unwrap().status, JobStatus::Succeeded);
    }

    #[test]
    fn test_db_register_job_rejects_id_beyond_sqlite_range() {
        let db = Database::in_memory().unwrap();
        let err = db.register_job(u64::MAX, "cis", Utc::now()).unwrap_err();
        assert!(matches!(err, SummarizerError::Config(_)));
        assert!(db.get_job(u64::MAX).unwrap().is_none());
        assert!(db.list_jobs(10, 0).unwrap().is_empty());
    }
}
