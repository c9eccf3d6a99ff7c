pub mod benchmarks;
pub mod health;
pub mod jobs;
pub mod results;
pub mod summaries;
