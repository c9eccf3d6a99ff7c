use crate::cli::commands::BenchmarksArgs;
use crate::cli::open_database;
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use crate::models::BenchmarkFile;
use tracing::info;

pub async fn handle_benchmarks(args: BenchmarksArgs, config: SummarizerConfig) -> Result<(), SummarizerError> {
    let content = tokio::fs::read_to_string(&args.file).await?;
    // YAML is a superset of JSON, so one parser covers both.
    let file: BenchmarkFile = serde_yaml::from_str(&content)?;

    if let Some(bad) = file.benchmarks.iter().find(|b| b.id.trim().is_empty()) {
        return Err(SummarizerError::Config(format!("benchmark with empty id (title '{}')", bad.title)));
    }

    let db = open_database(&config, args.db.as_deref())?;
    for def in &file.benchmarks {
        db.upsert_benchmark(def)?;
    }
    info!(count = file.benchmarks.len(), file = %args.file, "Benchmarks imported");
    println!("Imported {} benchmark definitions", file.benchmarks.len());
    Ok(())
}
