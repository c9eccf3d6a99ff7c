use serde::{Deserialize, Serialize};

/// Resource type recorded when a result arrives without one.
pub const UNKNOWN_RESOURCE_TYPE: &str = "-";

/// Conformance status of one control evaluated against one resource.
/// `Ok` is the only passing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Ok,
    Alarm,
    Info,
    Skip,
    Error,
}

impl ComplianceStatus {
    /// Parse a status as emitted by query runners. Empty or unrecognised
    /// values become `Error` so a single bad row never fails a job.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ok" => Self::Ok,
            "alarm" => Self::Alarm,
            "info" => Self::Info,
            "skip" => Self::Skip,
            _ => Self::Error,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Alarm => "alarm",
            Self::Info => "info",
            Self::Skip => "skip",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a control, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Empty or unrecognised severities become `None`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation of one control against one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub control_id: String,
    /// Root benchmark this evaluation is reported under.
    pub benchmark_id: String,
    /// Every benchmark the control rolls up into, including `benchmark_id`.
    #[serde(default)]
    pub parent_benchmarks: Vec<String>,
    pub resource_type: String,
    /// Canonical resource identity. Only ever used for distinct counting.
    pub platform_resource_id: String,
    pub integration_id: String,
    pub status: ComplianceStatus,
    pub severity: Severity,
    pub cost_impact: Option<f64>,
    #[serde(default)]
    pub resource_collections: Vec<String>,
    /// Evaluation time in epoch milliseconds.
    pub evaluated_at: i64,
}

impl ComplianceResult {
    pub fn normalized_resource_type(&self) -> &str {
        if self.resource_type.trim().is_empty() {
            UNKNOWN_RESOURCE_TYPE
        } else {
            &self.resource_type
        }
    }
}

/// Nil-safe cost addition: `None + None = None`, `None + x = x`.
pub fn add_cost_impact(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(a + b),
    }
}
