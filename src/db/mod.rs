pub mod connection;
pub mod schema;
pub mod results;
pub mod jobs;
pub mod summaries;
pub mod benchmarks;

pub use connection::Database;

use crate::errors::SummarizerError;

/// Job ids are stored in SQLite INTEGER columns.
pub(crate) fn sql_id(id: u64) -> Result<i64, SummarizerError> {
    i64::try_from(id).map_err(|_| SummarizerError::Config(format!("job id {} exceeds {}", id, i64::MAX)))
}
pub use jobs::JobRecord;
pub use summaries::SummaryRecord;
