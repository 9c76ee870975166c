use crate::backends::{BackendRegistry, BackendRequest};
use crate::router::ModelRouter;
use crate::scheduler::SchedulerSettings;
use crate::scheduler::job::JobStatus;
use crate::scheduler::store::JobStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, info, warn, error};
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Executes one job at a time: expands it into per-article tasks, runs
/// them under a bounded concurrency limit, and aggregates the outcome
/// back into the job record.
pub struct WorkerPool {
    store: Arc<JobStore>,
    router: Arc<ModelRouter>,
    backends: Arc<BackendRegistry>,
    settings: SchedulerSettings,
}

/// Everything one task needs, cloneable into its spawned future
#[derive(Clone)]
struct TaskContext {
    store: Arc<JobStore>,
    router: Arc<ModelRouter>,
    backends: Arc<BackendRegistry>,
    job_id: String,
    group_ref: Option<String>,
    cancel: Arc<AtomicBool>,
    deadline: Duration,
}

impl WorkerPool {
    pub fn new(
        store: Arc<JobStore>,
        router: Arc<ModelRouter>,
        backends: Arc<BackendRegistry>,
        settings: SchedulerSettings,
    ) -> Self {
        Self { store, router, backends, settings }
    }

    /// Run a dispatched job to its terminal state. Returns once every task
    /// has settled or cancellation has drained the in-flight ones.
    pub async fn run_job(&self, job_id: &str, cancel: Arc<AtomicBool>) {
        let job = match self.store.get(job_id).await {
            Some(job) => job,
            None => {
                error!("Dispatched job '{}' vanished from the store", job_id);
                return;
            }
        };

        let total = job.article_count as usize;
        let group_ref = job.request.model_group.clone()
            .or_else(|| self.settings.default_model_group.clone());

        info!(
            "Running job '{}' ({} articles, mode {:?}, concurrency {})",
            job_id, total, job.mode, self.settings.task_concurrency
        );

        let context = TaskContext {
            store: self.store.clone(),
            router: self.router.clone(),
            backends: self.backends.clone(),
            job_id: job_id.to_string(),
            group_ref,
            cancel: cancel.clone(),
            deadline: self.settings.task_timeout,
        };

        let semaphore = Arc::new(Semaphore::new(self.settings.task_concurrency));
        let mut handles = Vec::with_capacity(total);

        for index in 0..total {
            let prompt = job.request.task_prompt(index);
            let context = context.clone();
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                context.execute(index, prompt).await;
            }));
        }

        for outcome in join_all(handles).await {
            if outcome.is_err() {
                // A panicked task never reached its counter update.
                let _ = self.store.update(job_id, |job| {
                    job.failed_count += 1;
                    job.error = Some("generation task aborted unexpectedly".to_string());
                    job.progress = job.settled_progress();
                }).await;
            }
        }

        self.finalize(job_id, cancel.load(Ordering::SeqCst)).await;
    }

    async fn finalize(&self, job_id: &str, cancelled: bool) {
        let result = self.store.update(job_id, |job| {
            job.completed_at = Some(Utc::now());
            if cancelled {
                job.status = JobStatus::Cancelled;
                job.message = format!(
                    "Cancelled after {} of {} articles",
                    job.completed_count + job.failed_count,
                    job.article_count
                );
            } else if job.completed_count == 0 {
                job.status = JobStatus::Failed;
                job.progress = 100;
                job.message = format!("All {} generation tasks failed", job.article_count);
            } else {
                // Partial success still completes the job; failure detail
                // stays available through the counters and last error.
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.message = if job.failed_count > 0 {
                    format!(
                        "Generated {} of {} articles ({} failed)",
                        job.completed_count, job.article_count, job.failed_count
                    )
                } else {
                    format!("Generated {} of {} articles", job.completed_count, job.article_count)
                };
            }
        }).await;

        match result {
            Ok(job) => info!("Job '{}' finished as {} ({})", job_id, job.status, job.message),
            Err(e) => error!("Failed to finalize job '{}': {}", job_id, e),
        }
    }
}

impl TaskContext {
    /// Execute one generation task and fold its outcome into the job
    /// counters. Failures stop here; they never abort sibling tasks.
    async fn execute(self, index: usize, prompt: String) {
        // Cooperative cancellation: checked after the concurrency permit
        // is granted, so nothing new starts once the flag is set.
        if self.cancel.load(Ordering::SeqCst) {
            debug!("Job '{}': task {} abandoned after cancellation", self.job_id, index);
            return;
        }

        let outcome = self.generate(index, &prompt).await;

        let update = self.store.update(&self.job_id, |job| {
            match &outcome {
                Ok(()) => job.completed_count += 1,
                Err(reason) => {
                    job.failed_count += 1;
                    job.error = Some(reason.clone());
                }
            }
            job.progress = job.settled_progress();
            job.message = format!(
                "Generated {} of {} articles{}",
                job.completed_count,
                job.article_count,
                if job.failed_count > 0 { format!(" ({} failed)", job.failed_count) } else { String::new() }
            );
        }).await;

        if let Err(e) = update {
            error!("Job '{}': failed to record task {} outcome: {}", self.job_id, index, e);
        }
    }

    async fn generate(&self, index: usize, prompt: &str) -> Result<(), String> {
        let group_ref = self.group_ref.as_deref()
            .ok_or_else(|| "no model group configured for this job".to_string())?;

        let backend_id = self.router.resolve(group_ref).await.map_err(|e| e.to_string())?;
        let backend = self.backends.get(&backend_id).map_err(|e| e.to_string())?;

        let request = BackendRequest::new(prompt);
        match timeout(self.deadline, backend.generate(&request)).await {
            Ok(Ok(response)) => {
                debug!(
                    "Job '{}': task {} produced {} characters via '{}'",
                    self.job_id,
                    index,
                    response.content.len(),
                    backend_id
                );
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Job '{}': task {} failed on '{}': {}", self.job_id, index, backend_id, e);
                Err(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Job '{}': task {} timed out after {:?} on '{}'",
                    self.job_id, index, self.deadline, backend_id
                );
                Err(format!("generation timed out after {:?}", self.deadline))
            }
        }
    }
}
