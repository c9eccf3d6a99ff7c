use benchsum::cli::{self, Cli, Commands};
use benchsum::config;
use benchsum::errors::SummarizerError;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), SummarizerError> {
    if let Commands::Validate(args) = &cli.command {
        return handle_validate(&args.file).await;
    }

    let quiet = cli.quiet;
    let config = cli::load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve(args) => cli::serve::handle_serve(args, config).await,
        Commands::Summarize(args) => cli::summarize::handle_summarize(args, config, quiet).await,
        Commands::Ingest(args) => cli::ingest::handle_ingest(args, config, quiet).await,
        Commands::Benchmarks(args) => cli::benchmarks::handle_benchmarks(args, config).await,
        Commands::Report(args) => cli::report::handle_report(args, config).await,
        Commands::Status(args) => cli::status::handle_status(args, config).await,
        Commands::Stop(args) => cli::stop::handle_stop(args, config).await,
        Commands::Validate(_) => Ok(()),
    }
}

async fn handle_validate(file: &str) -> Result<(), SummarizerError> {
    let path = std::path::PathBuf::from(file);
    let _config = config::parse_config(&path).await?;
    println!("Configuration is valid: {}", file);
    Ok(())
}
