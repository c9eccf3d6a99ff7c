use chrono::Utc;

use crate::errors::SummarizerError;
use crate::models::BenchmarkDefinition;
use super::Database;

fn benchmark_from_row(row: &rusqlite::Row) -> rusqlite::Result<BenchmarkDefinition> {
    let controls: String = row.get(3)?;
    let controls = serde_json::from_str(&controls).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(BenchmarkDefinition {
        id: row.get(0)?,
        title: row.get(1)?,
        parent_id: row.get(2)?,
        controls,
    })
}

impl Database {
    pub fn upsert_benchmark(&self, def: &BenchmarkDefinition) -> Result<(), SummarizerError> {
        let controls = serde_json::to_string(&def.controls)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO benchmarks (id, title, parent_id, controls, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET title = excluded.title, parent_id = excluded.parent_id,
                controls = excluded.controls, updated_at = excluded.updated_at",
            rusqlite::params![def.id, def.title, def.parent_id, controls, Utc::now().to_rfc3339()],
        ).map_err(|e| SummarizerError::Database(format!("Failed to store benchmark: {}", e)))?;
        Ok(())
    }

    pub fn get_benchmark(&self, id: &str) -> Result<Option<BenchmarkDefinition>, SummarizerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, title, parent_id, controls FROM benchmarks WHERE id = ?1")
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        match stmt.query_row(rusqlite::params![id], benchmark_from_row) {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SummarizerError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn list_benchmarks(&self) -> Result<Vec<BenchmarkDefinition>, SummarizerError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, title, parent_id, controls FROM benchmarks ORDER BY id")
            .map_err(|e| SummarizerError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map([], benchmark_from_row)
            .map_err(|e| SummarizerError::Database(format!("Query error: {}", e)))?;

        let mut benchmarks = Vec::new();
        for row in rows {
            benchmarks.push(row.map_err(|e| SummarizerError::Database(format!("Row error: {}", e)))?);
        }
        Ok(benchmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, parent: Option<&str>, controls: &[&str]) -> BenchmarkDefinition {
        BenchmarkDefinition {
            id: id.to_string(),
            title: format!("{} benchmark", id),
            parent_id: parent.map(str::to_string),
            controls: controls.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_db_upsert_and_get_benchmark() {
        let db = Database::in_memory().unwrap();
        let cis = def("cis", None, &["mfa", "root-keys"]);
        db.upsert_benchmark(&cis).unwrap();
        assert_eq!(db.get_benchmark("cis").unwrap(), Some(cis));
        assert!(db.get_benchmark("pci").unwrap().is_none());
    }

    #[test]
    fn test_db_upsert_benchmark_replaces() {
        let db = Database::in_memory().unwrap();
        db.upsert_benchmark(&def("cis-iam", None, &[])).unwrap();
        db.upsert_benchmark(&def("cis-iam", Some("cis"), &["mfa"])).unwrap();

        let list = db.list_benchmarks().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].parent_id.as_deref(), Some("cis"));
        assert_eq!(list[0].controls, vec!["mfa"]);
    }

    #[test]
    fn test_db_list_benchmarks_sorted() {
        let db = Database::in_memory().unwrap();
        db.upsert_benchmark(&def("soc2", None, &[])).unwrap();
        db.upsert_benchmark(&def("cis", None, &[])).unwrap();
        let ids: Vec<_> = db.list_benchmarks().unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["cis", "soc2"]);
    }
}
