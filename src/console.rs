//! Interactive console for the job scheduler.
//!
//! Reads one command per line (rustyline, with history), hands parsed
//! commands to the scheduler, and prints listings. A background task ticks
//! the scheduler every 100ms so jobs keep dispatching and reaping while the
//! console waits for input; the task observes a cancellation token that is
//! cancelled when the console exits.

use std::sync::Arc;
use std::time::Duration;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::scheduler::{JobRecord, JobState, Scheduler};

const PROMPT: &str = "job-scheduler> ";
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Listing output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Result of handling one console line.
enum CommandOutcome {
    Continue,
    Exit,
}

/// The operator-facing console loop and its scheduler.
pub struct Console {
    scheduler: Arc<RwLock<Scheduler>>,
    runtime: Runtime,
    output: OutputFormat,
    shutdown: CancellationToken,
}

impl Console {
    pub fn new(config: SchedulerConfig, output: OutputFormat) -> Result<Self> {
        let runtime = Runtime::new()?;
        let scheduler = Arc::new(RwLock::new(Scheduler::new(config)));
        Ok(Self {
            scheduler,
            runtime,
            output,
            shutdown: CancellationToken::new(),
        })
    }

    /// Run the console loop until `exit` or end of input.
    pub fn run(self) -> Result<()> {
        let mut rl: Editor<(), DefaultHistory> = Editor::new()?;

        self.spawn_ticker();

        println!("Type 'help' for commands, 'exit' to quit.");
        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!(error = %e, "Failed to record history entry");
                    }
                    match self.process_line(&line) {
                        CommandOutcome::Continue => {}
                        CommandOutcome::Exit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("Error: {e}");
                    break;
                }
            }
        }

        self.shutdown.cancel();
        Ok(())
    }

    /// Background loop that advances the scheduler on a fixed cadence and
    /// prints a notice for every job that reaches a terminal state.
    fn spawn_ticker(&self) {
        let scheduler = self.scheduler.clone();
        let token = self.shutdown.clone();
        self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let reaped = scheduler.write().await.advance();
                        for job in reaped {
                            print_completion(&job);
                        }
                    }
                }
            }
        });
    }

    fn process_line(&self, line: &str) -> CommandOutcome {
        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            return CommandOutcome::Continue;
        };
        match command {
            "submit" => self.handle_submit(tokens.map(String::from).collect()),
            "showjobs" => self.show_jobs(),
            "submithistory" => self.show_history(),
            "cancel" => self.handle_cancel(tokens.next()),
            "help" => println!("{HELP_TEXT}"),
            "exit" => return CommandOutcome::Exit,
            other => println!("Invalid command: {other}. Type 'help' for available commands."),
        }
        CommandOutcome::Continue
    }

    fn handle_submit(&self, argv: Vec<String>) {
        let result = self
            .runtime
            .block_on(async { self.scheduler.write().await.submit(argv) });
        match result {
            Ok(id) => println!("Job {id} submitted"),
            Err(e) => println!("Submission rejected: {e}"),
        }
    }

    fn handle_cancel(&self, arg: Option<&str>) {
        let Some(id) = arg.and_then(|s| s.parse::<u64>().ok()) else {
            println!("Usage: cancel <job-id>");
            return;
        };
        let result = self
            .runtime
            .block_on(async { self.scheduler.write().await.cancel(id) });
        match result {
            Ok(()) => println!("Job {id} canceled"),
            Err(e) => println!("Cancel failed: {e}"),
        }
    }

    fn show_jobs(&self) {
        let listings: Vec<JobListing> = self.runtime.block_on(async {
            let scheduler = self.scheduler.read().await;
            scheduler.jobs().into_iter().map(JobListing::from).collect()
        });
        match self.output {
            OutputFormat::Json => print_json(&listings),
            OutputFormat::Table => println!("{}", render_jobs_table(&listings)),
        }
    }

    fn show_history(&self) {
        let listings: Vec<JobListing> = self.runtime.block_on(async {
            let scheduler = self.scheduler.read().await;
            scheduler
                .history()
                .into_iter()
                .map(JobListing::from)
                .collect()
        });
        match self.output {
            OutputFormat::Json => print_json(&listings),
            OutputFormat::Table => println!("{}", render_history_table(&listings)),
        }
    }
}

/// Flattened job view for listings, shared by the table and JSON formats.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct JobListing {
    id: u64,
    command: String,
    state: String,
    exit_code: Option<i32>,
    failure: Option<String>,
    started_at: Option<String>,
    finished_at: Option<String>,
}

impl From<&JobRecord> for JobListing {
    fn from(job: &JobRecord) -> Self {
        Self {
            id: job.id,
            command: job.command_line(),
            state: job.state.to_string(),
            exit_code: job.exit_code,
            failure: job.failure.clone(),
            started_at: job.started_at.map(|t| t.to_rfc3339()),
            finished_at: job.finished_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn render_jobs_table(listings: &[JobListing]) -> String {
    let mut out = String::from("Job queue:\n");
    out.push_str(&format!("{:<8} {:<12} COMMAND\n", "ID", "STATE"));
    for listing in listings {
        out.push_str(&format!(
            "{:<8} {:<12} {}\n",
            listing.id, listing.state, listing.command
        ));
    }
    out.push_str(&format!("{} job(s) queued", listings.len()));
    out
}

fn render_history_table(listings: &[JobListing]) -> String {
    let mut out = String::from("Job history:\n");
    out.push_str(&format!(
        "{:<8} {:<12} {:<6} {:<26} {:<26} COMMAND\n",
        "ID", "STATE", "EXIT", "STARTED", "FINISHED"
    ));
    for listing in listings {
        let exit = listing
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<8} {:<12} {:<6} {:<26} {:<26} {}\n",
            listing.id,
            listing.state,
            exit,
            listing.started_at.as_deref().unwrap_or("-"),
            listing.finished_at.as_deref().unwrap_or("-"),
            listing.command
        ));
    }
    out.push_str(&format!("{} job(s) finished", listings.len()));
    out
}

fn print_completion(job: &JobRecord) {
    match job.state {
        JobState::Completed => println!("Job {} ({}) completed", job.id, job.command_line()),
        JobState::Failed => {
            let cause = job.failure.as_deref().unwrap_or("unknown cause");
            println!("Job {} ({}) failed: {}", job.id, job.command_line(), cause);
        }
        _ => {}
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error: failed to encode listing: {e}"),
    }
}

const HELP_TEXT: &str = "\
Commands:
  submit <program> [args...]   Queue a program for execution
  showjobs                     List queued jobs (waiting and running)
  submithistory                List finished jobs with timestamps
  cancel <job-id>              Terminate a running job or drop a waiting one
  help                         Show this help
  exit                         Quit the scheduler";
