use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::Utc;
use tokio::process::{Child, Command};

use crate::error::{JobqError, Result};
use crate::scheduler::{JobRecord, JobState};

/// Spawns job processes with their output streams captured to files.
///
/// For job `N`, stdout goes to `<dir>/N.out` and stderr to `<dir>/N.err`.
/// Both files are created on every dispatch attempt, even when the spawn
/// itself fails afterwards, so a failed dispatch still leaves inspectable
/// artifacts.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    artifact_dir: PathBuf,
}

impl ProcessLauncher {
    pub fn new(artifact_dir: PathBuf) -> Self {
        Self { artifact_dir }
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Start the job's process and return its handle.
    ///
    /// The record is stamped `Running` with a start time *before* the spawn
    /// is attempted, so a failed spawn still leaves a timestamped record for
    /// the scheduler to fail. A program that exists but cannot be executed
    /// is only observable later, through the exit status at reap time and
    /// the `.err` artifact.
    pub fn start(&self, job: &mut JobRecord) -> Result<Child> {
        job.started_at = Some(Utc::now());
        job.state = JobState::Running;

        let stdout = create_artifact(&job.stdout_path)?;
        let stderr = create_artifact(&job.stderr_path)?;

        let program = job.program().to_string();
        let args = job.argv.get(1..).unwrap_or(&[]);
        let child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| JobqError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::info!(
            job_id = job.id,
            program = %program,
            pid = ?child.id(),
            "Job process started"
        );
        Ok(child)
    }
}

fn create_artifact(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| JobqError::Artifact {
        path: path.to_path_buf(),
        source,
    })
}
