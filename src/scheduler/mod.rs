pub mod dispatch;
pub mod job;
pub mod queue;

pub use dispatch::Scheduler;
pub use job::{JobRecord, JobState};
pub use queue::BoundedJobQueue;
