use crate::constants;
use crate::errors::{ForgeError, ForgeResult};

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// What kind of content a job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    Topic,
    Keywords,
    Trends,
    Spin,
    Freeform,
}

/// Lifecycle state of a generation job
///
/// Transitions are one-way: `queued → processing → {completed, failed,
/// cancelled}` plus the shortcut `queued → cancelled`. Terminal states
/// have no outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(ForgeError::Validation(format!("unknown job status '{}'", other))),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

fn default_word_count() -> u32 {
    constants::DEFAULT_WORD_COUNT
}

fn default_tone() -> String {
    constants::DEFAULT_TONE.to_string()
}

fn default_spin_intensity() -> String {
    "medium".to_string()
}

/// A single or bulk generation submission
///
/// `topics` carries one entry per article; a bulk request with fewer
/// topics than `article_count` repeats the last topic for the remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub mode: JobMode,
    pub article_count: u32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub spin_source: Option<String>,
    #[serde(default)]
    pub spin_angle: Option<String>,
    #[serde(default = "default_spin_intensity")]
    pub spin_intensity: String,
    #[serde(default)]
    pub trend_region: Option<String>,
    #[serde(default)]
    pub model_group: Option<String>,
}

impl JobRequest {
    pub fn validate(&self, max_articles: u32) -> ForgeResult<()> {
        if self.article_count < 1 {
            return Err(ForgeError::Validation(
                "article_count must be at least 1".to_string(),
            ));
        }
        if self.article_count > max_articles {
            return Err(ForgeError::Validation(format!(
                "article_count must not exceed {} per job",
                max_articles
            )));
        }

        match self.mode {
            JobMode::Spin => {
                if self.spin_source.as_deref().map_or(true, |s| s.trim().is_empty()) {
                    return Err(ForgeError::Validation(
                        "spin_source is required for spin mode".to_string(),
                    ));
                }
            }
            _ => {
                if self.topics.is_empty() {
                    return Err(ForgeError::Validation(
                        "at least one topic is required".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    fn topic_for(&self, index: usize) -> &str {
        match self.topics.get(index) {
            Some(topic) => topic,
            None => self.topics.last().map(|t| t.as_str()).unwrap_or(""),
        }
    }

    /// Build the prompt for one task of this job.
    pub fn task_prompt(&self, index: usize) -> String {
        let topic = self.topic_for(index);
        match self.mode {
            JobMode::Topic => {
                let mut prompt = format!(
                    "Write a {}-word {} article about: {}",
                    self.word_count, self.tone, topic
                );
                if !self.keywords.is_empty() {
                    prompt.push_str(&format!("\nIncorporate these keywords naturally: {}", self.keywords.join(", ")));
                }
                prompt
            }
            JobMode::Keywords => format!(
                "Write a {}-word {} article built around these keywords: {}",
                self.word_count,
                self.tone,
                if self.keywords.is_empty() { topic.to_string() } else { self.keywords.join(", ") }
            ),
            JobMode::Trends => format!(
                "Write a {}-word {} article covering the trending topic '{}' in {}",
                self.word_count,
                self.tone,
                topic,
                self.trend_region.as_deref().unwrap_or("US")
            ),
            JobMode::Spin => format!(
                "Rewrite the following article with a {} spin towards '{}', keeping roughly {} words:\n\n{}",
                self.spin_intensity,
                self.spin_angle.as_deref().unwrap_or(topic),
                self.word_count,
                self.spin_source.as_deref().unwrap_or_default()
            ),
            JobMode::Freeform => topic.to_string(),
        }
    }
}

/// One generation job as stored and reported to callers
///
/// Counters and progress are mutated by the worker pool, status and queue
/// position by the queue manager; once a terminal status is reached the
/// record no longer changes. `version` is bumped on every store mutation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJob {
    pub id: String,
    pub owner_id: String,
    pub mode: JobMode,
    pub article_count: u32,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
    pub completed_count: u32,
    pub failed_count: u32,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub request: JobRequest,
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl GenerationJob {
    pub fn new(owner_id: impl Into<String>, request: JobRequest, seq: u64, queue_position: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            mode: request.mode,
            article_count: request.article_count,
            status: JobStatus::Queued,
            queue_position: Some(queue_position),
            completed_count: 0,
            failed_count: 0,
            progress: 0,
            message: format!("Waiting in queue (position {})", queue_position),
            error: None,
            version: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            request,
            seq,
        }
    }

    /// Progress derived from settled task counts, floored to a percentage.
    pub fn settled_progress(&self) -> u8 {
        let settled = self.completed_count + self.failed_count;
        ((settled * 100) / self.article_count.max(1)) as u8
    }
}
