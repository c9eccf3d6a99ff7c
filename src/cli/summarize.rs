use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::catalog::CatalogCache;
use crate::cli::commands::SummarizeArgs;
use crate::cli::{open_database, spinner};
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use crate::pipeline::{JobRequest, JobWorker};
use crate::reporting::format_summary_markdown;
use crate::summary::BenchmarkSummary;
use tracing::info;

pub async fn handle_summarize(args: SummarizeArgs, mut config: SummarizerConfig, quiet: bool) -> Result<(), SummarizerError> {
    if let Some(page_size) = args.page_size {
        config.page_size = page_size.max(1);
    }
    let db = open_database(&config, args.db.as_deref())?;
    let catalog = Arc::new(CatalogCache::new());
    catalog.refresh_from(&db)?;

    let worker = JobWorker::new(db.clone(), catalog, &config);
    let request = match args.job_id {
        Some(job_id) => {
            let created_at = Utc::now();
            db.register_job(job_id, &args.benchmark, created_at)?;
            JobRequest { job_id, benchmark_id: args.benchmark.clone(), created_at }
        }
        None => worker.create_job(&args.benchmark)?,
    };
    let job_id = request.job_id;
    info!(job_id, benchmark_id = %args.benchmark, "Summarizing benchmark");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let bar = spinner(&format!("Summarizing {} (job {})", args.benchmark, job_id), quiet);
    let result = worker.run(request, cancel).await;
    bar.finish_and_clear();

    if let Some(err) = result.to_error() {
        return Err(err);
    }

    let record = db.get_summary(&args.benchmark, job_id)?
        .ok_or_else(|| SummarizerError::Internal(format!("summary for job {} missing after run", job_id)))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record.document)?);
    } else {
        let summary: BenchmarkSummary = serde_json::from_value(record.document)?;
        if !quiet {
            eprintln!(
                "Processed {} results in {} pages",
                result.records_processed, result.pages_processed
            );
        }
        println!("{}", format_summary_markdown(&summary));
    }
    Ok(())
}
