/// Job queue and execution engine
///
/// Submissions enter through the queue manager, which owns FIFO ordering
/// and the job lifecycle; the worker pool owns task fan-out, bounded
/// concurrency and counter aggregation.

pub mod job;
pub mod queue;
pub mod store;
pub mod worker;

use crate::constants;
use std::time::Duration;

pub use job::{GenerationJob, JobMode, JobRequest, JobStatus};
pub use queue::JobQueueManager;
pub use store::JobStore;
pub use worker::WorkerPool;

/// Tunables shared by the queue manager and worker pool
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Upper bound on articles per submission
    pub max_articles_per_job: u32,
    /// Concurrent tasks per job
    pub task_concurrency: usize,
    /// Deadline for a single generation task
    pub task_timeout: Duration,
    /// Group used when a submission names none
    pub default_model_group: Option<String>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_articles_per_job: constants::DEFAULT_MAX_ARTICLES_PER_JOB,
            task_concurrency: constants::DEFAULT_TASK_CONCURRENCY,
            task_timeout: Duration::from_secs(constants::DEFAULT_TASK_TIMEOUT_SECS),
            default_model_group: None,
        }
    }
}
