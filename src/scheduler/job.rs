use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a submitted job.
///
/// Transitions only move forward: `Waiting -> Running -> Completed | Failed`.
/// A job that never gets dispatched (canceled while waiting, or its spawn
/// fails) ends up in `Failed` with a recorded cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Waiting,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Terminal states are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Waiting => write!(f, "waiting"),
            JobState::Running => write!(f, "running"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// One submitted unit of work and its execution state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique, strictly increasing within one scheduler run.
    pub id: u64,
    /// Full argument vector; the program name is element 0.
    pub argv: Vec<String>,
    pub state: JobState,
    /// Exit code observed at reap time. `None` while running or when the
    /// process died to a signal.
    pub exit_code: Option<i32>,
    /// Recorded cause when the job ends up in `Failed`.
    pub failure: Option<String>,
    /// Where the child's stdout is captured (`<dir>/<id>.out`).
    pub stdout_path: PathBuf,
    /// Where the child's stderr is captured (`<dir>/<id>.err`).
    pub stderr_path: PathBuf,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(id: u64, argv: Vec<String>, artifact_dir: &Path) -> Self {
        Self {
            stdout_path: artifact_dir.join(format!("{id}.out")),
            stderr_path: artifact_dir.join(format!("{id}.err")),
            id,
            argv,
            state: JobState::Waiting,
            exit_code: None,
            failure: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// The executable to invoke.
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    /// Space-joined command line for listings.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}
