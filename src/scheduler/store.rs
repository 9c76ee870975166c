use crate::errors::{ForgeError, ForgeResult};
use crate::scheduler::job::{GenerationJob, JobStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

/// In-memory job store.
///
/// Concurrent task completions and status reads race on the same records;
/// every mutation goes through `update`, which bumps the record's version
/// counter so readers can detect interleaved writes.
pub struct JobStore {
    jobs: RwLock<HashMap<String, GenerationJob>>,
    seq: AtomicU64,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Monotone submission sequence; orders jobs independent of clock
    /// resolution.
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn insert(&self, job: GenerationJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    pub async fn get(&self, id: &str) -> Option<GenerationJob> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Fetch a job scoped to its owner. A job belonging to someone else is
    /// reported as missing, not as forbidden.
    pub async fn get_for_owner(&self, id: &str, owner_id: &str) -> ForgeResult<GenerationJob> {
        match self.jobs.read().await.get(id) {
            Some(job) if job.owner_id == owner_id => Ok(job.clone()),
            _ => Err(ForgeError::NotFound(format!("job '{}' does not exist", id))),
        }
    }

    /// Apply a mutation under the write lock and bump the version counter.
    pub async fn update<F>(&self, id: &str, mutate: F) -> ForgeResult<GenerationJob>
    where
        F: FnOnce(&mut GenerationJob),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| ForgeError::NotFound(format!("job '{}' does not exist", id)))?;
        mutate(job);
        job.version += 1;
        Ok(job.clone())
    }

    pub async fn list_for_owner(&self, owner_id: &str, status: Option<JobStatus>) -> Vec<GenerationJob> {
        let jobs = self.jobs.read().await;
        let mut listed: Vec<GenerationJob> = jobs
            .values()
            .filter(|j| j.owner_id == owner_id)
            .filter(|j| status.map_or(true, |s| j.status == s))
            .cloned()
            .collect();
        listed.sort_by_key(|j| j.seq);
        listed
    }

    pub async fn queued_count(&self) -> u32 {
        self.jobs
            .read()
            .await
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .count() as u32
    }

    /// Reassign queue positions 1..n over the still-queued jobs in
    /// submission order. Called whenever a job leaves the queue.
    pub async fn recompute_queue_positions(&self) {
        let mut jobs = self.jobs.write().await;
        let mut queued: Vec<&mut GenerationJob> = jobs
            .values_mut()
            .filter(|j| j.status == JobStatus::Queued)
            .collect();
        queued.sort_by_key(|j| j.seq);
        for (index, job) in queued.into_iter().enumerate() {
            let position = (index + 1) as u32;
            if job.queue_position != Some(position) {
                job.queue_position = Some(position);
                job.message = format!("Waiting in queue (position {})", position);
                job.version += 1;
            }
        }
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
