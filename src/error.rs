use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::scheduler::JobState;

#[derive(Error, Debug)]
pub enum JobqError {
    #[error("job queue is full ({capacity} entries)")]
    QueueFull { capacity: usize },

    #[error("empty command")]
    EmptyCommand,

    #[error("job not found: {0}")]
    JobNotFound(u64),

    #[error("job {id} is {state}, only waiting or running jobs can be canceled")]
    NotCancelable { id: u64, state: JobState },

    #[error("failed to create artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to kill job {id}: {source}")]
    Kill {
        id: u64,
        #[source]
        source: io::Error,
    },

    #[error("console error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, JobqError>;
