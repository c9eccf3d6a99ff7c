use std::sync::Arc;
use console::style;
use crate::catalog::CatalogCache;
use crate::cli::commands::IngestArgs;
use crate::cli::{open_database, spinner};
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use crate::ingest::Ingestor;
use tracing::info;

const MAX_LISTED_ERRORS: usize = 20;

pub async fn handle_ingest(args: IngestArgs, config: SummarizerConfig, quiet: bool) -> Result<(), SummarizerError> {
    let content = tokio::fs::read_to_string(&args.file).await?;
    let db = open_database(&config, args.db.as_deref())?;
    let catalog = Arc::new(CatalogCache::new());
    catalog.refresh_from(&db)?;
    let ingestor = Ingestor::new(db, catalog);

    info!(file = %args.file, "Ingesting compliance results");
    let bar = spinner(&format!("Ingesting {}", args.file), quiet);
    let report = if content.trim_start().starts_with('[') {
        let rows: Vec<serde_json::Value> = serde_json::from_str(&content)?;
        ingestor.ingest_values(rows)?
    } else {
        ingestor.ingest_jsonl(&content)?
    };
    bar.finish_and_clear();

    println!(
        "{} inserted, {} stale, {} rejected",
        style(report.inserted).green(),
        report.stale_skipped,
        style(report.errors.len()).red(),
    );
    for e in report.errors.iter().take(MAX_LISTED_ERRORS) {
        println!("  {} {}: {}", style("✗").red(), e.index, e.error);
    }
    if report.errors.len() > MAX_LISTED_ERRORS {
        println!("  ... and {} more", report.errors.len() - MAX_LISTED_ERRORS);
    }

    if report.inserted == 0 && report.stale_skipped == 0 && !report.errors.is_empty() {
        return Err(SummarizerError::Decode(format!("no valid rows in {}", args.file)));
    }
    Ok(())
}
