use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "benchsum", version, about = "Compliance benchmark summarizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP REST API server and job worker
    Serve(ServeArgs),
    /// Summarize one benchmark now and store the result
    Summarize(SummarizeArgs),
    /// Load compliance results from a JSON array or JSON-lines file
    Ingest(IngestArgs),
    /// Import benchmark definitions from a YAML or JSON file
    Benchmarks(BenchmarksArgs),
    /// Print a stored benchmark summary
    Report(ReportArgs),
    /// Query a job on a running server
    Status(StatusArgs),
    /// Stop a job on a running server
    Stop(StopArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<String>,

    /// Max concurrent jobs (overrides config)
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Args, Clone)]
pub struct SummarizeArgs {
    /// Benchmark to summarize
    #[arg(short, long)]
    pub benchmark: String,

    /// Job id to store the summary under; a new id is allocated when omitted
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=i64::MAX as u64))]
    pub job_id: Option<u64>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<String>,

    /// Results per page (overrides config)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Print the summary as JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct IngestArgs {
    /// Results file (.json array or .jsonl)
    pub file: String,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<String>,
}

#[derive(Args, Clone)]
pub struct BenchmarksArgs {
    /// Definitions file with a top-level `benchmarks` list
    pub file: String,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<String>,
}

#[derive(Args, Clone)]
pub struct ReportArgs {
    /// Benchmark to report on
    #[arg(short, long)]
    pub benchmark: String,

    /// Job id; the latest summary is used when omitted
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=i64::MAX as u64))]
    pub job_id: Option<u64>,

    /// Output the raw summary document
    #[arg(long)]
    pub json: bool,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<String>,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// Job ID to query
    pub job_id: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Continuously poll until the job finishes
    #[arg(long)]
    pub follow: bool,

    /// Poll interval in seconds
    #[arg(long, default_value = "2")]
    pub interval: u64,

    /// Server base URL (defaults to the configured server)
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(Args, Clone)]
pub struct StopArgs {
    /// Job ID to stop
    pub job_id: u64,

    /// Server base URL (defaults to the configured server)
    #[arg(long)]
    pub server: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub file: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_summarize() {
        let cli = Cli::try_parse_from(["benchsum", "-vv", "summarize", "--benchmark", "cis", "--job-id", "42"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Summarize(args) => {
                assert_eq!(args.benchmark, "cis");
                assert_eq!(args.job_id, Some(42));
            }
            _ => panic!("expected summarize"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["benchsum", "status", "7", "--follow", "--log-json", "--config", "b.yaml"]).unwrap();
        assert!(cli.log_json);
        assert_eq!(cli.config.as_deref(), Some("b.yaml"));
        assert!(matches!(cli.command, Commands::Status(StatusArgs { job_id: 7, follow: true, .. })));
    }

    #[test]
    fn test_cli_validate_takes_file() {
        let cli = Cli::try_parse_from(["benchsum", "validate", "benchsum.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate(ValidateArgs { ref file }) if file == "benchsum.yaml"));
    }

    #[test]
    fn test_cli_rejects_job_id_beyond_i64() {
        let too_big = (i64::MAX as u64 + 1).to_string();
        assert!(Cli::try_parse_from(["benchsum", "summarize", "-b", "cis", "--job-id", too_big.as_str()]).is_err());
        assert!(Cli::try_parse_from(["benchsum", "summarize", "-b", "cis", "--job-id", "0"]).is_err());
        let max = i64::MAX.to_string();
        assert!(Cli::try_parse_from(["benchsum", "summarize", "-b", "cis", "--job-id", max.as_str()]).is_ok());
    }

    #[test]
    fn test_cli_requires_benchmark() {
        assert!(Cli::try_parse_from(["benchsum", "report"]).is_err());
    }
}
