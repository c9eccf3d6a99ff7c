use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::OptionalExtension;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::SummarizerError;
use crate::models::{ComplianceResult, ComplianceStatus, Severity};
use super::Database;

/// Identity of a stored result: one row per control, resource and connection
/// under a root benchmark. Newer evaluations replace older ones.
pub fn result_key(result: &ComplianceResult) -> String {
    let mut buf = Vec::with_capacity(128);
    for part in [
        &result.benchmark_id,
        &result.control_id,
        &result.platform_resource_id,
        &result.integration_id,
    ] {
        buf.extend_from_slice(part.as_bytes());
        buf.push(0x1f);
    }
    format!("{:032x}", xxh3_128(&buf))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultWrite {
    pub written: usize,
    /// Rows ignored because the store already held a newer evaluation.
    pub stale: usize,
}

/// One page of results in row order plus the row id to resume after.
#[derive(Debug, Clone, Default)]
pub struct ResultRows {
    pub records: Vec<ComplianceResult>,
    pub last_row: Option<i64>,
}

const UPSERT_RESULT: &str = "
INSERT INTO compliance_results (result_key, control_id, benchmark_id, resource_type, platform_resource_id, integration_id, status, severity, cost_impact, evaluated_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
ON CONFLICT(result_key) DO UPDATE SET
    resource_type = excluded.resource_type,
    status = excluded.status,
    severity = excluded.severity,
    cost_impact = excluded.cost_impact,
    evaluated_at = excluded.evaluated_at,
    updated_at = excluded.updated_at
WHERE excluded.evaluated_at >= compliance_results.evaluated_at
RETURNING id";

const SELECT_PAGE: &str = "
SELECT r.id, r.control_id, r.benchmark_id, r.resource_type, r.platform_resource_id, r.integration_id,
       r.status, r.severity, r.cost_impact, r.evaluated_at,
       (SELECT json_group_array(x.benchmark_id) FROM result_parent_benchmarks x WHERE x.result_row = r.id),
       (SELECT json_group_array(c.collection_id) FROM result_collections c WHERE c.result_row = r.id)
FROM result_parent_benchmarks p
JOIN compliance_results r ON r.id = p.result_row
WHERE p.benchmark_id = ?1 AND p.result_row > ?2
ORDER BY p.result_row
LIMIT ?3";

fn json_list(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    let mut values: Vec<String> = serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    values.sort();
    Ok(values)
}

impl Database {
    /// Upsert a batch of results in one transaction. Each result is indexed
    /// under its own benchmark and every entry of `parent_benchmarks`.
    pub fn insert_results(&self, results: &[ComplianceResult]) -> Result<ResultWrite, SummarizerError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()
            .map_err(|e| SummarizerError::Database(format!("Failed to begin transaction: {}", e)))?;
        let now = Utc::now().to_rfc3339();
        let mut write = ResultWrite::default();
        {
            let mut upsert = tx.prepare(UPSERT_RESULT)?;
            let mut clear_parents = tx.prepare("DELETE FROM result_parent_benchmarks WHERE result_row = ?1")?;
            let mut clear_collections = tx.prepare("DELETE FROM result_collections WHERE result_row = ?1")?;
            let mut add_parent = tx.prepare(
                "INSERT OR IGNORE INTO result_parent_benchmarks (benchmark_id, result_row) VALUES (?1, ?2)",
            )?;
            let mut add_collection = tx.prepare(
                "INSERT OR IGNORE INTO result_collections (result_row, collection_id) VALUES (?1, ?2)",
            )?;

            for result in results {
                let row_id: Option<i64> = upsert
                    .query_row(
                        rusqlite::params![
                            result_key(result),
                            result.control_id,
                            result.benchmark_id,
                            result.normalized_resource_type(),
                            result.platform_resource_id,
                            result.integration_id,
                            result.status.as_str(),
                            result.severity.as_str(),
                            result.cost_impact,
                            result.evaluated_at,
                            now,
                        ],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| SummarizerError::Database(format!("Failed to upsert result: {}", e)))?;

                let Some(row_id) = row_id else {
                    write.stale += 1;
                    continue;
                };

                clear_parents.execute([row_id])?;
                clear_collections.execute([row_id])?;

                let mut parents: BTreeSet<&str> =
                    result.parent_benchmarks.iter().map(String::as_str).collect();
                parents.insert(&result.benchmark_id);
                for parent in parents {
                    add_parent.execute(rusqlite::params![parent, row_id])?;
                }
                for collection in result.resource_collections.iter().filter(|c| !c.is_empty()) {
                    add_collection.execute(rusqlite::params![row_id, collection])?;
                }
                write.written += 1;
            }
        }
        tx.commit()
            .map_err(|e| SummarizerError::Database(format!("Failed to commit results: {}", e)))?;
        Ok(write)
    }

    /// Keyset page of results whose parent set contains `benchmark_id`,
    /// strictly after `after_row`.
    pub fn fetch_results_page(
        &self,
        benchmark_id: &str,
        after_row: i64,
        limit: usize,
    ) -> Result<ResultRows, SummarizerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_PAGE)
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(
            rusqlite::params![benchmark_id, after_row, limit as i64],
            |row: &rusqlite::Row| {
                let row_id: i64 = row.get(0)?;
                let status: String = row.get(6)?;
                let severity: String = row.get(7)?;
                Ok((
                    row_id,
                    ComplianceResult {
                        control_id: row.get(1)?,
                        benchmark_id: row.get(2)?,
                        resource_type: row.get(3)?,
                        platform_resource_id: row.get(4)?,
                        integration_id: row.get(5)?,
                        status: ComplianceStatus::parse_lenient(&status),
                        severity: Severity::parse_lenient(&severity),
                        cost_impact: row.get(8)?,
                        evaluated_at: row.get(9)?,
                        parent_benchmarks: json_list(row, 10)?,
                        resource_collections: json_list(row, 11)?,
                    },
                ))
            },
        ).map_err(|e| SummarizerError::Database(format!("Query error: {}", e)))?;

        let mut page = ResultRows::default();
        for row in rows {
            let (row_id, record) = row.map_err(|e| SummarizerError::Database(format!("Row error: {}", e)))?;
            page.last_row = Some(row_id);
            page.records.push(record);
        }
        Ok(page)
    }

    pub fn count_results(&self, benchmark_id: &str) -> Result<u64, SummarizerError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM result_parent_benchmarks WHERE benchmark_id = ?1",
            rusqlite::params![benchmark_id],
            |row| row.get(0),
        ).map_err(|e| SummarizerError::Database(format!("Query error: {}", e)))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(control: &str, resource: &str, status: ComplianceStatus, evaluated_at: i64) -> ComplianceResult {
        ComplianceResult {
            control_id: control.to_string(),
            benchmark_id: "cis-iam".to_string(),
            parent_benchmarks: vec!["cis".to_string(), "cis-iam".to_string()],
            resource_type: "aws::iam::user".to_string(),
            platform_resource_id: resource.to_string(),
            integration_id: "acct-1".to_string(),
            status,
            severity: Severity::High,
            cost_impact: Some(1.5),
            resource_collections: vec!["prod".to_string()],
            evaluated_at,
        }
    }

    #[test]
    fn test_db_insert_and_page_results() {
        let db = Database::in_memory().unwrap();
        let write = db.insert_results(&[
            make_result("mfa", "u1", ComplianceStatus::Ok, 10),
            make_result("mfa", "u2", ComplianceStatus::Alarm, 10),
        ]).unwrap();
        assert_eq!(write.written, 2);

        let page = db.fetch_results_page("cis", 0, 10).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].platform_resource_id, "u1");
        assert_eq!(page.records[1].status, ComplianceStatus::Alarm);
        assert_eq!(page.records[0].parent_benchmarks, vec!["cis", "cis-iam"]);
        assert_eq!(page.records[0].resource_collections, vec!["prod"]);
        assert_eq!(page.records[0].cost_impact, Some(1.5));
    }

    #[test]
    fn test_db_results_visible_under_every_parent() {
        let db = Database::in_memory().unwrap();
        db.insert_results(&[make_result("mfa", "u1", ComplianceStatus::Ok, 10)]).unwrap();
        assert_eq!(db.count_results("cis").unwrap(), 1);
        assert_eq!(db.count_results("cis-iam").unwrap(), 1);
        assert_eq!(db.count_results("soc2").unwrap(), 0);
    }

    #[test]
    fn test_db_pagination_is_stable() {
        let db = Database::in_memory().unwrap();
        let batch: Vec<_> = (0..7)
            .map(|i| make_result("mfa", &format!("u{}", i), ComplianceStatus::Ok, 10))
            .collect();
        db.insert_results(&batch).unwrap();

        let mut seen = Vec::new();
        let mut after = 0;
        loop {
            let page = db.fetch_results_page("cis", after, 3).unwrap();
            if page.records.is_empty() {
                break;
            }
            seen.extend(page.records.iter().map(|r| r.platform_resource_id.clone()));
            after = page.last_row.unwrap();
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(seen[0], "u0");
        assert_eq!(seen[6], "u6");
    }

    #[test]
    fn test_db_newer_evaluation_replaces_row() {
        let db = Database::in_memory().unwrap();
        db.insert_results(&[make_result("mfa", "u1", ComplianceStatus::Alarm, 10)]).unwrap();
        let write = db.insert_results(&[make_result("mfa", "u1", ComplianceStatus::Ok, 20)]).unwrap();
        assert_eq!(write.written, 1);

        let page = db.fetch_results_page("cis", 0, 10).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].status, ComplianceStatus::Ok);
        assert_eq!(page.records[0].evaluated_at, 20);
    }

    #[test]
    fn test_db_older_evaluation_is_stale() {
        let db = Database::in_memory().unwrap();
        db.insert_results(&[make_result("mfa", "u1", ComplianceStatus::Ok, 20)]).unwrap();
        let write = db.insert_results(&[make_result("mfa", "u1", ComplianceStatus::Alarm, 5)]).unwrap();
        assert_eq!(write, ResultWrite { written: 0, stale: 1 });

        let page = db.fetch_results_page("cis", 0, 10).unwrap();
        assert_eq!(page.records[0].status, ComplianceStatus::Ok);
    }

    #[test]
    fn test_db_reingest_replaces_collections() {
        let db = Database::in_memory().unwrap();
        db.insert_results(&[make_result("mfa", "u1", ComplianceStatus::Ok, 10)]).unwrap();
        let mut moved = make_result("mfa", "u1", ComplianceStatus::Ok, 11);
        moved.resource_collections = vec!["staging".to_string()];
        db.insert_results(&[moved]).unwrap();

        let page = db.fetch_results_page("cis", 0, 10).unwrap();
        assert_eq!(page.records[0].resource_collections, vec!["staging"]);
    }

    #[test]
    fn test_result_key_ignores_status_and_time() {
        let a = make_result("mfa", "u1", ComplianceStatus::Ok, 1);
        let b = make_result("mfa", "u1", ComplianceStatus::Alarm, 99);
        let c = make_result("mfa", "u2", ComplianceStatus::Ok, 1);
        assert_eq!(result_key(&a), result_key(&b));
        assert_ne!(result_key(&a), result_key(&c));
    }
}
