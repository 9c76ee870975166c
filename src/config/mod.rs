//! Configuration module for TOML-based engine configuration.
//!
//! # Example Configuration File
//!
//! ```toml
//! [scheduler]
//! max_articles_per_job = 50
//! task_concurrency = 5
//! task_timeout_secs = 120
//! default_model_group = "default"
//!
//! [[backends]]
//! id = "ollama-main"
//! kind = "ollama"
//! endpoint = "http://localhost:11434"
//! default_model = "llama3.1:8b"
//!
//! [[model_groups]]
//! name = "default"
//! models = ["ollama-main"]
//! strategy = "round-robin"
//! ```
//!
//! # Environment Variables
//!
//! API keys and endpoints can reference environment variables using the
//! `${VAR_NAME}` syntax. These are resolved at load time.

mod types;
mod loader;

pub use types::{Config, SchedulerConfig, BackendConfig, ModelGroupConfig};
pub use loader::{load_config, parse_config};
