use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ComplianceResult;
use super::accumulator::{ResultAccumulator, SeverityPolicy};
use super::control::ControlRollup;

/// Totals for one scope, broken down by resource type and by control.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollupGroup {
    pub result: ResultAccumulator,
    pub resource_types: BTreeMap<String, ResultAccumulator>,
    pub controls: BTreeMap<String, ControlRollup>,
}

impl RollupGroup {
    /// Fold one normalized result into this group's totals, its resource
    /// type accumulator and its control rollup.
    pub fn add_result(&mut self, result: &ComplianceResult, policy: SeverityPolicy) {
        self.result.add_result(result.status, result.severity, result.cost_impact, policy);

        self.resource_types
            .entry(result.normalized_resource_type().to_string())
            .or_default()
            .add_result(result.status, result.severity, result.cost_impact, policy);

        self.controls
            .entry(result.control_id.clone())
            .or_default()
            .add_result(
                &result.platform_resource_id,
                &result.integration_id,
                result.status,
                result.cost_impact,
            );
    }

    pub fn summarize(&mut self) {
        self.result.compute_security_score();
        for acc in self.resource_types.values_mut() {
            acc.compute_security_score();
        }
        for control in self.controls.values_mut() {
            control.finalize();
        }
    }

    /// Controls that saw at least one failing result.
    pub fn failed_controls(&self) -> impl Iterator<Item = (&String, &ControlRollup)> {
        self.controls.iter().filter(|(_, c)| !c.passed)
    }
}

/// A scope's rollup plus the same rollup per connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionBreakdown {
    pub benchmark: RollupGroup,
    pub connections: BTreeMap<String, RollupGroup>,
}

impl ConnectionBreakdown {
    pub fn add_result(&mut self, result: &ComplianceResult, policy: SeverityPolicy) {
        self.benchmark.add_result(result, policy);
        self.connections
            .entry(result.integration_id.clone())
            .or_default()
            .add_result(result, policy);
    }

    pub fn summarize(&mut self) {
        self.benchmark.summarize();
        for group in self.connections.values_mut() {
            group.summarize();
        }
    }
}
