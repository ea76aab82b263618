use std::path::PathBuf;

use crate::scheduler::queue::DEFAULT_CAPACITY;

/// Default concurrency cap when none is configured.
pub const DEFAULT_MAX_JOBS: usize = 4;

/// Runtime configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of jobs allowed to run in parallel.
    pub max_jobs: usize,
    /// Maximum number of jobs held in the queue (waiting and running).
    pub queue_capacity: usize,
    /// Directory where per-job `.out`/`.err` capture files are written.
    pub artifact_dir: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_jobs: DEFAULT_MAX_JOBS,
            queue_capacity: DEFAULT_CAPACITY,
            artifact_dir: PathBuf::from("."),
        }
    }
}

impl SchedulerConfig {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            max_jobs,
            ..Default::default()
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_default() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.max_jobs, 4);
        assert_eq!(cfg.queue_capacity, 256);
        assert_eq!(cfg.artifact_dir, PathBuf::from("."));
    }

    #[test]
    fn scheduler_config_new() {
        let cfg = SchedulerConfig::new(2);
        assert_eq!(cfg.max_jobs, 2);
        assert_eq!(cfg.queue_capacity, 256);
    }

    #[test]
    fn scheduler_config_builders() {
        let cfg = SchedulerConfig::new(1)
            .with_queue_capacity(8)
            .with_artifact_dir("/tmp/jobs");
        assert_eq!(cfg.queue_capacity, 8);
        assert_eq!(cfg.artifact_dir, PathBuf::from("/tmp/jobs"));
    }
}
