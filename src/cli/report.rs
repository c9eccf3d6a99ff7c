use console::style;
use crate::cli::commands::ReportArgs;
use crate::cli::open_database;
use crate::config::SummarizerConfig;
use crate::errors::SummarizerError;
use crate::reporting::format_summary_markdown;
use crate::summary::BenchmarkSummary;

pub async fn handle_report(args: ReportArgs, config: SummarizerConfig) -> Result<(), SummarizerError> {
    let db = open_database(&config, args.db.as_deref())?;
    let record = match args.job_id {
        Some(job_id) => db.get_summary(&args.benchmark, job_id)?,
        None => db.latest_summary(&args.benchmark)?,
    };
    let record = record.ok_or_else(|| {
        SummarizerError::UnknownBenchmark(format!("no summary stored for {}", args.benchmark))
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record.document)?);
        return Ok(());
    }

    let score = record.security_score;
    let headline = format!("Security score {:.1}%", score);
    let styled = if score >= 80.0 {
        style(headline).green().bold()
    } else if score >= 50.0 {
        style(headline).yellow().bold()
    } else {
        style(headline).red().bold()
    };
    println!("{}  (job {}, updated {})\n", styled, record.job_id, record.updated_at);

    let summary: BenchmarkSummary = serde_json::from_value(record.document)?;
    println!("{}", format_summary_markdown(&summary));
    Ok(())
}
