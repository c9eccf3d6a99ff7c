pub mod decoder;

pub use decoder::{decode_jsonl, decode_row, DecodeError, RowOutcome};

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::BenchmarkCatalog;
use crate::db::Database;
use crate::errors::SummarizerError;
use crate::models::ComplianceResult;

/// A row that was rejected, by position in the input.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowError {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    /// Rows older than what the store already holds for the same key.
    pub stale_skipped: usize,
    pub errors: Vec<RowError>,
}

/// Decodes raw rows, resolves their benchmark lineage and writes them to the
/// result store. Bad rows are reported; good rows in the same batch still land.
pub struct Ingestor {
    db: Database,
    catalog: Arc<dyn BenchmarkCatalog>,
}

impl Ingestor {
    pub fn new(db: Database, catalog: Arc<dyn BenchmarkCatalog>) -> Self {
        Self { db, catalog }
    }

    /// Ingest a batch of JSON values. Error indexes are 0-based array positions.
    pub fn ingest_values(&self, rows: Vec<serde_json::Value>) -> Result<IngestReport, SummarizerError> {
        let outcomes = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (index, decode_row(row)));
        self.write(outcomes)
    }

    /// Ingest JSON lines. Error indexes are 1-based line numbers.
    pub fn ingest_jsonl(&self, input: &str) -> Result<IngestReport, SummarizerError> {
        let outcomes = decode_jsonl(input)
            .into_iter()
            .map(|o| (o.line, o.result));
        self.write(outcomes)
    }

    fn write(
        &self,
        outcomes: impl Iterator<Item = (usize, Result<ComplianceResult, DecodeError>)>,
    ) -> Result<IngestReport, SummarizerError> {
        let mut report = IngestReport::default();
        let mut accepted = Vec::new();

        for (index, outcome) in outcomes {
            match outcome {
                Ok(mut result) => {
                    self.resolve_parents(&mut result);
                    accepted.push(result);
                }
                Err(e) => {
                    debug!(index, error = %e, "Rejected result row");
                    report.errors.push(RowError { index, error: e.to_string() });
                }
            }
        }

        if !accepted.is_empty() {
            let write = self.db.insert_results(&accepted)?;
            report.inserted = write.written;
            report.stale_skipped = write.stale;
        }

        info!(
            inserted = report.inserted,
            stale = report.stale_skipped,
            rejected = report.errors.len(),
            "Ingested compliance results"
        );
        Ok(report)
    }

    /// Parent benchmarks are the catalog lineage of `benchmark_id` plus any
    /// the row already carried.
    fn resolve_parents(&self, result: &mut ComplianceResult) {
        let mut parents: BTreeSet<String> = self.catalog.lineage(&result.benchmark_id).into_iter().collect();
        parents.extend(result.parent_benchmarks.drain(..));
        result.parent_benchmarks = parents.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogCache;
    use crate::models::BenchmarkDefinition;
    use serde_json::json;

    fn ingestor() -> (Database, Ingestor) {
        let db = Database::in_memory().unwrap();
        let catalog = CatalogCache::from_definitions(vec![
            BenchmarkDefinition { id: "cis".into(), title: String::new(), parent_id: None, controls: vec![] },
            BenchmarkDefinition { id: "cis-iam".into(), title: String::new(), parent_id: Some("cis".into()), controls: vec![] },
        ]);
        let ingestor = Ingestor::new(db.clone(), Arc::new(catalog));
        (db, ingestor)
    }

    fn row(resource: &str) -> serde_json::Value {
        json!({
            "control_id": "mfa",
            "benchmark_id": "cis-iam",
            "integration_id": "acct-1",
            "platform_resource_id": resource,
            "status": "ok",
            "evaluated_at": 10
        })
    }

    #[test]
    fn test_ingest_resolves_lineage() {
        let (db, ingestor) = ingestor();
        let report = ingestor.ingest_values(vec![row("u1")]).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(db.count_results("cis").unwrap(), 1);
        assert_eq!(db.count_results("cis-iam").unwrap(), 1);

        let page = db.fetch_results_page("cis", 0, 10).unwrap();
        assert_eq!(page.records[0].parent_benchmarks, vec!["cis", "cis-iam"]);
    }

    #[test]
    fn test_ingest_reports_bad_rows_and_keeps_good() {
        let (db, ingestor) = ingestor();
        let report = ingestor
            .ingest_values(vec![row("u1"), json!({"benchmark_id": "cis"}), row("u2")])
            .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.errors, vec![RowError {
            index: 1,
            error: "missing required field 'control_id'".into(),
        }]);
        assert_eq!(db.count_results("cis-iam").unwrap(), 2);
    }

    #[test]
    fn test_ingest_jsonl_is_idempotent() {
        let (db, ingestor) = ingestor();
        let input = format!("{}\n{}\n", row("u1"), row("u2"));
        ingestor.ingest_jsonl(&input).unwrap();
        let again = ingestor.ingest_jsonl(&input).unwrap();
        assert_eq!(again.inserted, 2);
        assert_eq!(db.count_results("cis").unwrap(), 2);
    }

    #[test]
    fn test_ingest_unknown_benchmark_indexes_itself() {
        let (db, ingestor) = ingestor();
        let mut r = row("u1");
        r["benchmark_id"] = json!("adhoc");
        ingestor.ingest_values(vec![r]).unwrap();
        assert_eq!(db.count_results("adhoc").unwrap(), 1);
        assert_eq!(db.count_results("cis").unwrap(), 0);
    }
}
