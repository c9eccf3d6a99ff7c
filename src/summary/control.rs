use serde::{Deserialize, Serialize};

use crate::models::{add_cost_impact, ComplianceStatus};
use super::estimator::CardinalityEstimator;

/// Pass/fail state and distinct resource/connection counts for one control.
///
/// The estimators are insert-only while results are accumulated and are read
/// exactly once, by [`ControlRollup::finalize`]. The counts are zero until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRollup {
    pub passed: bool,
    pub failed_resources_count: u64,
    pub total_resources_count: u64,
    pub failed_connection_count: u64,
    pub total_connection_count: u64,
    pub cost_impact: Option<f64>,

    #[serde(skip)]
    all_resources: CardinalityEstimator,
    #[serde(skip)]
    failed_resources: CardinalityEstimator,
    #[serde(skip)]
    all_connections: CardinalityEstimator,
    #[serde(skip)]
    failed_connections: CardinalityEstimator,
}

impl Default for ControlRollup {
    fn default() -> Self {
        Self {
            passed: true,
            failed_resources_count: 0,
            total_resources_count: 0,
            failed_connection_count: 0,
            total_connection_count: 0,
            cost_impact: None,
            all_resources: CardinalityEstimator::new(),
            failed_resources: CardinalityEstimator::new(),
            all_connections: CardinalityEstimator::new(),
            failed_connections: CardinalityEstimator::new(),
        }
    }
}

impl ControlRollup {
    pub fn add_result(
        &mut self,
        resource_id: &str,
        connection_id: &str,
        status: ComplianceStatus,
        cost_impact: Option<f64>,
    ) {
        self.all_resources.insert(resource_id.as_bytes());
        self.all_connections.insert(connection_id.as_bytes());
        if !status.is_passed() {
            self.passed = false;
            self.failed_resources.insert(resource_id.as_bytes());
            self.failed_connections.insert(connection_id.as_bytes());
        }
        self.cost_impact = add_cost_impact(self.cost_impact, cost_impact);
    }

    /// Resolve the estimator counts. Must run after the last `add_result`.
    pub fn finalize(&mut self) {
        self.total_resources_count = self.all_resources.estimate();
        self.failed_resources_count = self.failed_resources.estimate();
        self.total_connection_count = self.all_connections.estimate();
        self.failed_connection_count = self.failed_connections.estimate();
    }
}
