use std::collections::HashMap;

use chrono::Utc;
use tokio::process::Child;

use crate::config::SchedulerConfig;
use crate::error::{JobqError, Result};
use crate::launcher::ProcessLauncher;
use crate::scheduler::job::{JobRecord, JobState};
use crate::scheduler::queue::BoundedJobQueue;

/// Drives the dispatch/reap cycle for submitted jobs.
///
/// Jobs wait in a bounded FIFO queue. Up to `max_jobs` of them run at once
/// as child processes tracked in the active set, each polled with a
/// non-blocking status check on every [`advance`](Scheduler::advance).
/// Queue position is decoupled from the execution slots: a long-running job
/// at the head does not stop jobs behind it from being dispatched, the head
/// only gates when reaped records drain into the history.
pub struct Scheduler {
    config: SchedulerConfig,
    launcher: ProcessLauncher,
    queue: BoundedJobQueue,
    /// In-flight process handles, keyed by job id.
    active: HashMap<u64, Child>,
    /// Terminal records drained off the queue head, in drain order.
    history: Vec<JobRecord>,
    /// Submission counter; ids are never reused within one run.
    next_job_id: u64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let launcher = ProcessLauncher::new(config.artifact_dir.clone());
        let queue = BoundedJobQueue::with_capacity(config.queue_capacity);
        Self {
            config,
            launcher,
            queue,
            active: HashMap::new(),
            history: Vec::new(),
            next_job_id: 0,
        }
    }

    /// Queue a command for execution. `argv[0]` is the program name.
    ///
    /// Rejects an empty command, and rejects submission outright when the
    /// queue is at capacity; neither mutates any state.
    pub fn submit(&mut self, argv: Vec<String>) -> Result<u64> {
        if argv.first().map_or(true, |p| p.is_empty()) {
            return Err(JobqError::EmptyCommand);
        }
        let id = self.next_job_id;
        let job = JobRecord::new(id, argv, self.launcher.artifact_dir());
        self.queue.insert(job)?;
        self.next_job_id += 1;
        tracing::debug!(job_id = id, "Job queued");
        Ok(id)
    }

    /// Advance the dispatch/reap state machine by one step.
    ///
    /// Polls every in-flight child without blocking, drains terminal records
    /// off the queue head, and dispatches at most one waiting job if an
    /// execution slot is free. A no-op on an empty queue. Returns snapshots
    /// of the records that reached a terminal state during this call, so the
    /// caller can print completion notices.
    pub fn advance(&mut self) -> Vec<JobRecord> {
        let mut reaped = self.poll_active();
        self.drain_head();
        if let Some(failed) = self.dispatch_next() {
            reaped.push(failed);
        }
        reaped
    }

    /// Non-blocking exit check for every in-flight child.
    fn poll_active(&mut self) -> Vec<JobRecord> {
        let mut finished = Vec::new();
        let ids: Vec<u64> = self.active.keys().copied().collect();
        for id in ids {
            let Some(child) = self.active.get_mut(&id) else {
                continue;
            };
            match child.try_wait() {
                // Still running; stays in the active set, retried next tick.
                Ok(None) => {}
                Ok(Some(status)) => {
                    self.active.remove(&id);
                    if let Some(job) = self.reap(id, status.code(), status.success()) {
                        finished.push(job);
                    }
                }
                Err(e) => {
                    tracing::warn!(job_id = id, error = %e, "Status check failed");
                    self.active.remove(&id);
                    if let Some(job) = self.queue.find_mut(id) {
                        job.finished_at = Some(Utc::now());
                        job.state = JobState::Failed;
                        job.failure.get_or_insert(format!("wait failed: {e}"));
                        finished.push(job.clone());
                    }
                }
            }
        }
        finished
    }

    /// Mark an exited job terminal and return a snapshot of its record.
    fn reap(&mut self, id: u64, exit_code: Option<i32>, success: bool) -> Option<JobRecord> {
        let job = self.queue.find_mut(id)?;
        job.finished_at = Some(Utc::now());
        job.exit_code = exit_code;
        if success {
            job.state = JobState::Completed;
            // A cancel that lost the race with a clean exit may have left a
            // cause behind; only `Failed` records carry one.
            job.failure = None;
        } else {
            job.state = JobState::Failed;
            // A cancel may already have recorded the cause.
            job.failure.get_or_insert(match exit_code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            });
        }
        tracing::info!(
            job_id = id,
            state = %job.state,
            exit_code = ?job.exit_code,
            "Job reaped"
        );
        Some(job.clone())
    }

    /// Drain terminal records off the queue head into the history.
    ///
    /// Explicit loop bounded by the current queue length; a burst of
    /// simultaneous completions drains in one call, while a still-running
    /// head stops the drain without stopping dispatch.
    fn drain_head(&mut self) {
        for _ in 0..self.queue.len() {
            match self.queue.peek_head() {
                Some(job) if job.state.is_terminal() => {
                    if let Some(job) = self.queue.remove_head() {
                        self.history.push(job);
                    }
                }
                _ => break,
            }
        }
    }

    /// Dispatch the first waiting job in FIFO order, if a slot is free.
    ///
    /// One dispatch per call; the caller's tick cadence spreads a backlog
    /// over successive calls. A spawn failure moves the job straight to
    /// `Failed` with the cause recorded, and the failed record is returned
    /// so it surfaces like any other terminal transition.
    fn dispatch_next(&mut self) -> Option<JobRecord> {
        if self.active.len() >= self.config.max_jobs {
            return None;
        }
        let pos = (0..self.queue.len())
            .find(|&pos| self.queue.get(pos).is_some_and(|j| j.state == JobState::Waiting))?;
        let launcher = &self.launcher;
        let job = self.queue.get_mut(pos)?;
        match launcher.start(job) {
            Ok(child) => {
                self.active.insert(job.id, child);
                None
            }
            Err(e) => {
                tracing::warn!(job_id = job.id, error = %e, "Job dispatch failed");
                job.state = JobState::Failed;
                job.finished_at = Some(Utc::now());
                job.failure = Some(e.to_string());
                // The error artifact was already created; put the cause in it
                // so a failed dispatch stays inspectable on disk.
                if let Err(io_err) = std::fs::write(&job.stderr_path, format!("{e}\n")) {
                    tracing::warn!(job_id = job.id, error = %io_err, "Could not record spawn error");
                }
                Some(job.clone())
            }
        }
    }

    /// Kill a running job, or fail a waiting one in place.
    ///
    /// A killed job is reaped as `Failed` on a later `advance`, once the
    /// process has actually exited.
    pub fn cancel(&mut self, id: u64) -> Result<()> {
        let Some(job) = self.queue.find_mut(id) else {
            return Err(JobqError::JobNotFound(id));
        };
        match job.state {
            JobState::Waiting => {
                job.state = JobState::Failed;
                job.finished_at = Some(Utc::now());
                job.failure = Some("canceled before dispatch".to_string());
                tracing::info!(job_id = id, "Waiting job canceled");
                Ok(())
            }
            JobState::Running => {
                job.failure = Some("canceled by operator".to_string());
                if let Some(child) = self.active.get_mut(&id) {
                    child
                        .start_kill()
                        .map_err(|source| JobqError::Kill { id, source })?;
                }
                tracing::info!(job_id = id, "Running job killed");
                Ok(())
            }
            state => Err(JobqError::NotCancelable { id, state }),
        }
    }

    /// Records still in the queue and not yet terminal, FIFO order.
    pub fn jobs(&self) -> Vec<&JobRecord> {
        self.queue
            .iter()
            .filter(|job| !job.state.is_terminal())
            .collect()
    }

    /// Every record that reached a terminal state: drained history first,
    /// then terminal records still waiting behind a running queue head.
    pub fn history(&self) -> Vec<&JobRecord> {
        self.history
            .iter()
            .chain(self.queue.iter().filter(|job| job.state.is_terminal()))
            .collect()
    }

    /// Number of jobs currently holding an execution slot.
    pub fn running_count(&self) -> usize {
        self.active.len()
    }

    /// Live records in the queue, terminal or not.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}
