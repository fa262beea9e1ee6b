//! Background analysis jobs with progress polling.

mod options;
mod queue;

pub use options::QueueOptions;
pub use queue::{Analyzer, JobId, JobInfo, JobQueue, JobStatus};
