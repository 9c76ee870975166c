//! Configuration types for TOML-based engine configuration.
//!
//! These types map directly to the TOML configuration file structure.

use crate::constants;
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Scheduler tunables.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Backend declarations.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,

    /// Model groups seeded at startup.
    #[serde(default)]
    pub model_groups: Vec<ModelGroupConfig>,
}

/// Scheduler tunables.
#[derive(Debug, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum articles a single job may request.
    #[serde(default = "default_max_articles")]
    pub max_articles_per_job: u32,

    /// Concurrent generation tasks per job.
    #[serde(default = "default_task_concurrency")]
    pub task_concurrency: usize,

    /// Deadline in seconds for one generation task.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_secs: u64,

    /// Group used when a submission names none.
    pub default_model_group: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_articles_per_job: default_max_articles(),
            task_concurrency: default_task_concurrency(),
            task_timeout_secs: default_task_timeout(),
            default_model_group: None,
        }
    }
}

fn default_max_articles() -> u32 {
    constants::DEFAULT_MAX_ARTICLES_PER_JOB
}

fn default_task_concurrency() -> usize {
    constants::DEFAULT_TASK_CONCURRENCY
}

fn default_task_timeout() -> u64 {
    constants::DEFAULT_TASK_TIMEOUT_SECS
}

/// One backend declaration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Identifier model groups reference.
    pub id: String,

    /// Backend kind: "ollama" or "openai".
    pub kind: String,

    /// Base URL of the inference service.
    pub endpoint: Option<String>,

    /// API key (supports environment variable syntax: "${VAR_NAME}").
    #[serde(default)]
    pub api_key: String,

    /// Model used when a request names none.
    pub default_model: String,

    /// Whether this backend accepts work.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One model group seeded at startup.
#[derive(Debug, Deserialize)]
pub struct ModelGroupConfig {
    /// Unique group name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Backend ids, in rotation order.
    pub models: Vec<String>,

    /// Routing strategy: "round-robin" or "priority".
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Weights parallel to `models`; required for "priority".
    pub weights: Option<Vec<u32>>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_strategy() -> String {
    "round-robin".to_string()
}

fn default_true() -> bool {
    true
}
