//! Articleforge is the scheduling and routing core of a multi-tenant
//! content generation platform.
//!
//! It accepts single or bulk article-generation jobs, dispatches them in
//! strict submission order, fans each job out into concurrently executed
//! per-article tasks, and routes every task to one of several
//! interchangeable model backends through named model groups.
//!
//! # Features
//!
//! - **FIFO job scheduling**: jobs start strictly in submission order,
//!   with live queue positions and progress counters
//! - **Bounded fan-out**: each job's tasks run under a configurable
//!   concurrency limit and per-task deadline
//! - **Cooperative cancellation**: cancelling lets in-flight tasks finish
//!   but prevents new ones from starting
//! - **Model groups**: round-robin or weighted routing across Ollama and
//!   OpenAI-compatible backends
//! - **Config portability**: versioned export/import of the full routing
//!   configuration
//!
//! # Example
//!
//! ```no_run
//! use articleforge::{GenerationEngine, JobRequest, JobMode};
//!
//! async fn example() {
//!     let engine = GenerationEngine::from_config_file("articleforge.toml")
//!         .await
//!         .expect("Failed to build engine");
//!
//!     let request = JobRequest {
//!         mode: JobMode::Topic,
//!         article_count: 3,
//!         topics: vec!["Rust in production".to_string()],
//!         word_count: 1200,
//!         tone: "Professional".to_string(),
//!         keywords: vec![],
//!         spin_source: None,
//!         spin_angle: None,
//!         spin_intensity: "medium".to_string(),
//!         trend_region: None,
//!         model_group: None,
//!     };
//!
//!     let job = engine.submit_job("owner-1", request).await.unwrap();
//!     println!("queued at position {:?}", job.queue_position);
//! }
//! ```

pub mod api;
pub mod backends;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod portability;
pub mod router;
pub mod scheduler;

pub use backends::{
    BackendKind,
    BackendRegistry,
    BackendRequest,
    BackendResponse,
    ConnectionProbe,
    GenerationBackend,
    ModelInfo,
    create_backend,
};

pub use errors::{ForgeError, ForgeResult};

pub use engine::{GenerationEngine, EngineBuilder};

pub use router::{GroupPatch, GroupSpec, ModelGroup, ModelGroupRegistry, ModelRouter, RoutingStrategy};

pub use scheduler::{GenerationJob, JobMode, JobRequest, JobStatus, SchedulerSettings};

pub use portability::{ConfigBundle, ImportSummary};

/// Initialize the logging system
///
/// This should be called at the start of your application in case
/// you want to activate the library's debug and info logging.
pub fn use_logging() {
    env_logger::init();
}
