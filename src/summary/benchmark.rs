use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::ComplianceResult;
use super::accumulator::SeverityPolicy;
use super::group::ConnectionBreakdown;

/// Aggregate of every result for one `(benchmark_id, job_id)` run.
///
/// Built empty at job start, fed one record at a time through
/// [`BenchmarkSummary::add_compliance_result`], finalized once with
/// [`BenchmarkSummary::summarize`] and then emitted as a single document.
/// Mutation takes `&mut self`; an instance belongs to exactly one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub benchmark_id: String,
    pub job_id: u64,
    pub evaluated_at_epoch: i64,
    pub connections: ConnectionBreakdown,
    pub resource_collections: BTreeMap<String, ConnectionBreakdown>,

    #[serde(skip)]
    severity_policy: SeverityPolicy,
}

impl BenchmarkSummary {
    pub fn new(benchmark_id: &str, job_id: u64, evaluated_at_epoch: i64) -> Self {
        Self {
            benchmark_id: benchmark_id.to_string(),
            job_id,
            evaluated_at_epoch,
            connections: ConnectionBreakdown::default(),
            resource_collections: BTreeMap::new(),
            severity_policy: SeverityPolicy::default(),
        }
    }

    pub fn with_severity_policy(mut self, policy: SeverityPolicy) -> Self {
        self.severity_policy = policy;
        self
    }

    /// Fan one result out to the benchmark-wide rollup, its connection, and
    /// every resource collection it belongs to. Status and severity arrive
    /// already normalized by their types; the resource type is normalized
    /// by the rollup groups.
    pub fn add_compliance_result(&mut self, result: &ComplianceResult) {
        let policy = self.severity_policy;
        self.connections.add_result(result, policy);

        // A duplicated membership on one record still counts once.
        let collections: BTreeSet<&str> = result
            .resource_collections
            .iter()
            .map(String::as_str)
            .filter(|c| !c.is_empty())
            .collect();
        for collection in collections {
            self.resource_collections
                .entry(collection.to_string())
                .or_default()
                .add_result(result, policy);
        }
    }

    /// Finalize control counts and security scores at every level.
    /// Safe to call more than once.
    pub fn summarize(&mut self) {
        self.connections.summarize();
        for breakdown in self.resource_collections.values_mut() {
            breakdown.summarize();
        }
    }

    pub fn security_score(&self) -> f64 {
        self.connections.benchmark.result.security_score
    }

    pub fn total_results(&self) -> u64 {
        self.connections.benchmark.result.total()
    }

    pub fn to_document(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
