use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::errors::SummarizerError;
use crate::models::BenchmarkDefinition;

/// Read-only view of benchmark definitions handed to jobs and ingestion.
pub trait BenchmarkCatalog: Send + Sync {
    fn get(&self, id: &str) -> Option<BenchmarkDefinition>;

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The benchmark followed by each of its ancestors up to the root.
    /// Unknown benchmarks resolve to just themselves.
    fn lineage(&self, id: &str) -> Vec<String>;
}

/// Immutable set of definitions loaded at one point in time.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    benchmarks: HashMap<String, BenchmarkDefinition>,
}

impl CatalogSnapshot {
    pub fn from_definitions(definitions: Vec<BenchmarkDefinition>) -> Self {
        let benchmarks = definitions
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Self { benchmarks }
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    fn lineage(&self, id: &str) -> Vec<String> {
        let mut lineage = vec![id.to_string()];
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(id);

        let mut current = self.benchmarks.get(id);
        while let Some(parent) = current.and_then(|b| b.parent_id.as_deref()) {
            if !seen.insert(parent) {
                warn!(benchmark = %id, parent = %parent, "Cycle in benchmark hierarchy");
                break;
            }
            lineage.push(parent.to_string());
            current = self.benchmarks.get(parent);
        }
        lineage
    }
}

/// Catalog whose snapshot is swapped wholesale on explicit refresh.
#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: Vec<BenchmarkDefinition>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::from_definitions(definitions))),
        }
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, snapshot: CatalogSnapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }

    /// Reload every definition from the database. Returns the new size.
    pub fn refresh_from(&self, db: &Database) -> Result<usize, SummarizerError> {
        let definitions = db.list_benchmarks()?;
        let snapshot = CatalogSnapshot::from_definitions(definitions);
        let count = snapshot.len();
        self.replace(snapshot);
        debug!(benchmarks = count, "Benchmark catalog refreshed");
        Ok(count)
    }

    /// Refresh from the database every `every` until `cancel` fires.
    /// A failed refresh keeps the previous snapshot.
    pub fn spawn_refresh(
        self: Arc<Self>,
        db: Database,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Benchmark catalog refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh_from(&db) {
                            warn!(error = %e, "Benchmark catalog refresh failed");
                        }
                    }
                }
            }
        })
    }
}

impl BenchmarkCatalog for CatalogCache {
    fn get(&self, id: &str) -> Option<BenchmarkDefinition> {
        self.snapshot().benchmarks.get(id).cloned()
    }

    fn contains(&self, id: &str) -> bool {
        self.snapshot().benchmarks.contains_key(id)
    }

    fn lineage(&self, id: &str) -> Vec<String> {
        self.snapshot().lineage(id)
    }
}
