use crate::errors::{ForgeError, ForgeResult};
use crate::scheduler::SchedulerSettings;
use crate::scheduler::job::{GenerationJob, JobRequest, JobStatus};
use crate::scheduler::store::JobStore;
use crate::scheduler::worker::WorkerPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{mpsc, Mutex};

/// Admits jobs, keeps FIFO order, and drives the dispatcher.
///
/// A single dispatcher task consumes the submission channel, so jobs start
/// strictly in submission order and at most one job is processing at any
/// time; parallelism lives inside the worker pool, not across jobs.
pub struct JobQueueManager {
    store: Arc<JobStore>,
    settings: SchedulerSettings,
    tx: mpsc::UnboundedSender<String>,
    flags: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
}

impl JobQueueManager {
    /// Create the manager and spawn its dispatcher loop.
    pub fn start(
        store: Arc<JobStore>,
        worker: Arc<WorkerPool>,
        settings: SchedulerSettings,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let flags: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>> = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::dispatch_loop(rx, store.clone(), worker, flags.clone()));

        Arc::new(Self { store, settings, tx, flags })
    }

    async fn dispatch_loop(
        mut rx: mpsc::UnboundedReceiver<String>,
        store: Arc<JobStore>,
        worker: Arc<WorkerPool>,
        flags: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
    ) {
        while let Some(job_id) = rx.recv().await {
            let flag = match flags.lock().await.get(&job_id).cloned() {
                Some(flag) => flag,
                None => continue,
            };

            // Jobs cancelled while still queued are skipped here; their
            // record is already terminal.
            match store.get(&job_id).await {
                Some(job) if job.status == JobStatus::Queued => {}
                _ => {
                    flags.lock().await.remove(&job_id);
                    continue;
                }
            }

            let _ = store.update(&job_id, |job| {
                job.status = JobStatus::Processing;
                job.queue_position = None;
                job.started_at = Some(Utc::now());
                job.message = "Generation started".to_string();
            }).await;
            store.recompute_queue_positions().await;

            debug!("Dispatching job '{}'", job_id);
            worker.run_job(&job_id, flag).await;

            flags.lock().await.remove(&job_id);
        }
    }

    /// Admit a job: validate, assign the next queue position, persist and
    /// enqueue for dispatch. Returns the queued snapshot.
    pub async fn submit(&self, owner_id: &str, request: JobRequest) -> ForgeResult<GenerationJob> {
        request.validate(self.settings.max_articles_per_job)?;

        let seq = self.store.next_seq();
        let position = self.store.queued_count().await + 1;
        let job = GenerationJob::new(owner_id, request, seq, position);
        let job_id = job.id.clone();

        self.flags.lock().await.insert(job_id.clone(), Arc::new(AtomicBool::new(false)));
        self.store.insert(job.clone()).await;

        self.tx.send(job_id.clone()).map_err(|_| {
            ForgeError::Internal("job dispatcher is not running".to_string())
        })?;

        info!(
            "Job '{}' submitted by '{}' ({} articles, queue position {})",
            job_id, owner_id, job.article_count, position
        );
        Ok(job)
    }

    /// Request cancellation of a job owned by the caller.
    ///
    /// Queued jobs become `cancelled` immediately with zero tasks
    /// executed. Processing jobs get their cooperative flag set: tasks
    /// already running finish and keep counting, nothing new starts, and
    /// the worker finalizes the job as `cancelled`.
    pub async fn cancel(&self, job_id: &str, owner_id: &str) -> ForgeResult<GenerationJob> {
        let job = self.store.get_for_owner(job_id, owner_id).await?;

        match job.status {
            JobStatus::Queued => {
                if let Some(flag) = self.flags.lock().await.get(job_id) {
                    flag.store(true, Ordering::SeqCst);
                }
                let updated = self.store.update(job_id, |job| {
                    job.status = JobStatus::Cancelled;
                    job.queue_position = None;
                    job.completed_at = Some(Utc::now());
                    job.message = "Cancelled before processing started".to_string();
                }).await?;
                self.store.recompute_queue_positions().await;
                info!("Job '{}' cancelled while queued", job_id);
                Ok(updated)
            }
            JobStatus::Processing => {
                match self.flags.lock().await.get(job_id) {
                    Some(flag) => flag.store(true, Ordering::SeqCst),
                    None => warn!("Job '{}' is processing but has no cancellation flag", job_id),
                }
                info!("Job '{}' cancellation requested; draining in-flight tasks", job_id);
                self.store.update(job_id, |job| {
                    job.message = "Cancellation requested; waiting for running tasks".to_string();
                }).await
            }
            status => Err(ForgeError::Conflict(format!(
                "job '{}' is already {}",
                job_id, status
            ))),
        }
    }

    /// Fetch one job, scoped to the caller.
    pub async fn get(&self, job_id: &str, owner_id: &str) -> ForgeResult<GenerationJob> {
        self.store.get_for_owner(job_id, owner_id).await
    }

    /// List the caller's jobs in submission order, optionally filtered by
    /// status.
    pub async fn list(&self, owner_id: &str, status: Option<JobStatus>) -> Vec<GenerationJob> {
        self.store.list_for_owner(owner_id, status).await
    }
}
