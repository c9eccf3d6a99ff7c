pub mod estimator;
pub mod accumulator;
pub mod control;
pub mod group;
pub mod benchmark;

pub use estimator::CardinalityEstimator;
pub use accumulator::{ResultAccumulator, SeverityPolicy};
pub use control::ControlRollup;
pub use group::{ConnectionBreakdown, RollupGroup};
pub use benchmark::BenchmarkSummary;
