use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobq_lite::config::SchedulerConfig;
use jobq_lite::console::{Console, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "jobq-lite")]
#[command(version)]
#[command(about = "An interactive single-node job scheduler")]
struct Args {
    /// Maximum number of jobs allowed to run in parallel
    max_jobs: usize,

    /// Maximum number of jobs held in the queue
    #[arg(long, default_value = "256")]
    queue_capacity: usize,

    /// Directory for per-job .out/.err capture files
    #[arg(long, default_value = ".")]
    artifact_dir: PathBuf,

    /// Listing output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if args.max_jobs == 0 {
        eprintln!("Error: max_jobs must be at least 1");
        return ExitCode::FAILURE;
    }
    if args.queue_capacity == 0 {
        eprintln!("Error: queue capacity must be at least 1");
        return ExitCode::FAILURE;
    }

    if let Err(e) = std::fs::create_dir_all(&args.artifact_dir) {
        eprintln!(
            "Error: cannot create artifact directory {}: {e}",
            args.artifact_dir.display()
        );
        return ExitCode::FAILURE;
    }

    let config = SchedulerConfig::new(args.max_jobs)
        .with_queue_capacity(args.queue_capacity)
        .with_artifact_dir(args.artifact_dir);

    match Console::new(config, args.output).and_then(Console::run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
