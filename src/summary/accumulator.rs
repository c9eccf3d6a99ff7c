use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{add_cost_impact, ComplianceStatus, Severity};

/// Which results contribute to severity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityPolicy {
    /// Only failing results are counted, so severity totals describe findings.
    #[default]
    FailedOnly,
    /// Every result is counted regardless of status.
    All,
}

impl SeverityPolicy {
    fn counts(&self, status: ComplianceStatus) -> bool {
        match self {
            Self::FailedOnly => !status.is_passed(),
            Self::All => true,
        }
    }
}

/// Status and severity counters, the atomic rollup unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultAccumulator {
    pub query_result: BTreeMap<ComplianceStatus, u64>,
    pub severity_result: BTreeMap<Severity, u64>,
    /// Derived by [`ResultAccumulator::compute_security_score`].
    pub security_score: f64,
    pub cost_impact: Option<f64>,
}

impl ResultAccumulator {
    pub fn add_result(
        &mut self,
        status: ComplianceStatus,
        severity: Severity,
        cost_impact: Option<f64>,
        policy: SeverityPolicy,
    ) {
        *self.query_result.entry(status).or_insert(0) += 1;
        if policy.counts(status) {
            *self.severity_result.entry(severity).or_insert(0) += 1;
        }
        self.cost_impact = add_cost_impact(self.cost_impact, cost_impact);
    }

    pub fn total(&self) -> u64 {
        self.query_result.values().sum()
    }

    pub fn passed(&self) -> u64 {
        self.query_result.get(&ComplianceStatus::Ok).copied().unwrap_or(0)
    }

    pub fn failed(&self) -> u64 {
        self.total() - self.passed()
    }

    /// Percentage of passing results; zero when nothing was counted.
    pub fn compute_security_score(&mut self) {
        let total = self.total();
        self.security_score = if total > 0 {
            100.0 * self.passed() as f64 / total as f64
        } else {
            0.0
        };
    }
}
