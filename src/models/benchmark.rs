use serde::{Deserialize, Serialize};

/// A named set of controls, optionally nested under a parent benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Parent benchmark this one is a sub-benchmark of.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub controls: Vec<String>,
}

/// Top-level shape of a benchmark definitions file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkFile {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkDefinition>,
}
