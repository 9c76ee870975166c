use crate::backends::{create_backend, BackendKind, BackendRegistry, GenerationBackend};
use crate::config::{self, Config};
use crate::errors::{ForgeError, ForgeResult};
use crate::portability::{self, ConfigBundle, ImportSummary};
use crate::router::{GroupSpec, ModelGroupRegistry, ModelRouter, RoutingStrategy};
use crate::scheduler::{
    GenerationJob, JobQueueManager, JobRequest, JobStatus, JobStore, SchedulerSettings, WorkerPool,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

/// The assembled generation engine: job store, queue manager, worker pool,
/// backend inventory and model group routing behind one handle.
pub struct GenerationEngine {
    store: Arc<JobStore>,
    queue: Arc<JobQueueManager>,
    groups: Arc<ModelGroupRegistry>,
    backends: Arc<BackendRegistry>,
    router: Arc<ModelRouter>,
}

impl GenerationEngine {
    /// Creates a builder for a GenerationEngine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Build an engine from a TOML configuration string.
    pub async fn from_config_str(content: &str) -> ForgeResult<Self> {
        let config = config::parse_config(content)?;
        EngineBuilder::from_config(config)?.build().await
    }

    /// Build an engine from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(path: P) -> ForgeResult<Self> {
        let config = config::load_config(path)?;
        EngineBuilder::from_config(config)?.build().await
    }

    pub async fn submit_job(&self, owner_id: &str, request: JobRequest) -> ForgeResult<GenerationJob> {
        self.queue.submit(owner_id, request).await
    }

    pub async fn cancel_job(&self, job_id: &str, owner_id: &str) -> ForgeResult<GenerationJob> {
        self.queue.cancel(job_id, owner_id).await
    }

    pub async fn get_job(&self, job_id: &str, owner_id: &str) -> ForgeResult<GenerationJob> {
        self.queue.get(job_id, owner_id).await
    }

    pub async fn list_jobs(&self, owner_id: &str, status: Option<JobStatus>) -> Vec<GenerationJob> {
        self.queue.list(owner_id, status).await
    }

    pub async fn export_config(&self) -> ConfigBundle {
        portability::export(&self.groups).await
    }

    pub async fn import_config(&self, bundle: ConfigBundle) -> ForgeResult<ImportSummary> {
        portability::import(&self.groups, bundle).await
    }

    pub fn groups(&self) -> &Arc<ModelGroupRegistry> {
        &self.groups
    }

    pub fn backends(&self) -> &Arc<BackendRegistry> {
        &self.backends
    }

    pub fn router(&self) -> &Arc<ModelRouter> {
        &self.router
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }
}

enum BackendDecl {
    Declared {
        kind: BackendKind,
        id: String,
        endpoint: String,
        api_key: String,
        default_model: String,
        enabled: bool,
    },
    Custom(Arc<dyn GenerationBackend + Send + Sync>),
}

/// GenerationEngine builder
pub struct EngineBuilder {
    settings: SchedulerSettings,
    backend_decls: Vec<BackendDecl>,
    group_specs: Vec<GroupSpec>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            settings: SchedulerSettings::default(),
            backend_decls: Vec::new(),
            group_specs: Vec::new(),
        }
    }

    /// Populate a builder from a parsed configuration file.
    pub fn from_config(config: Config) -> ForgeResult<Self> {
        let mut builder = Self::new()
            .max_articles_per_job(config.scheduler.max_articles_per_job)
            .task_concurrency(config.scheduler.task_concurrency)
            .task_timeout(Duration::from_secs(config.scheduler.task_timeout_secs));

        if let Some(default_group) = config.scheduler.default_model_group {
            builder = builder.default_model_group(default_group);
        }

        for backend in config.backends {
            let kind = match backend.kind.to_lowercase().as_str() {
                "ollama" => BackendKind::Ollama,
                "openai" => BackendKind::OpenAI,
                other => {
                    return Err(ForgeError::Config(format!("Unknown backend kind '{}'", other)));
                }
            };
            let endpoint = backend.endpoint.unwrap_or_else(|| match kind {
                BackendKind::Ollama => crate::constants::DEFAULT_OLLAMA_ENDPOINT.to_string(),
                BackendKind::OpenAI => crate::constants::OPENAI_API_ENDPOINT.to_string(),
            });
            builder = builder.add_backend(
                kind,
                backend.id,
                endpoint,
                backend.api_key,
                backend.default_model,
                backend.enabled,
            );
        }

        for group in config.model_groups {
            let strategy = match group.strategy.to_lowercase().as_str() {
                "round-robin" => RoutingStrategy::RoundRobin,
                "priority" => RoutingStrategy::Priority,
                other => {
                    return Err(ForgeError::Config(format!("Unknown strategy '{}'", other)));
                }
            };
            builder = builder.define_group(GroupSpec {
                name: group.name,
                description: group.description,
                models: group.models,
                strategy,
                weights: group.weights,
                is_active: group.is_active,
            });
        }

        Ok(builder)
    }

    /// Sets the maximum articles a single job may request.
    pub fn max_articles_per_job(mut self, max: u32) -> Self {
        self.settings.max_articles_per_job = max;
        self
    }

    /// Sets the number of concurrent generation tasks per job.
    pub fn task_concurrency(mut self, concurrency: usize) -> Self {
        self.settings.task_concurrency = concurrency.max(1);
        self
    }

    /// Sets the deadline for a single generation task.
    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.settings.task_timeout = timeout;
        self
    }

    /// Sets the model group used when a submission names none.
    pub fn default_model_group(mut self, group: impl Into<String>) -> Self {
        self.settings.default_model_group = Some(group.into());
        self
    }

    /// Declares a backend to be constructed at build time.
    pub fn add_backend(
        mut self,
        kind: BackendKind,
        id: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
        enabled: bool,
    ) -> Self {
        self.backend_decls.push(BackendDecl::Declared {
            kind,
            id: id.into(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            default_model: default_model.into(),
            enabled,
        });
        self
    }

    /// Registers a pre-built backend (custom implementations, test doubles).
    pub fn register_backend(mut self, backend: Arc<dyn GenerationBackend + Send + Sync>) -> Self {
        self.backend_decls.push(BackendDecl::Custom(backend));
        self
    }

    /// Seeds a model group at build time.
    pub fn define_group(mut self, spec: GroupSpec) -> Self {
        self.group_specs.push(spec);
        self
    }

    /// Consumes the builder and constructs the engine, spawning its
    /// dispatcher.
    pub async fn build(self) -> ForgeResult<GenerationEngine> {
        let mut registry = BackendRegistry::new();
        for decl in self.backend_decls {
            match decl {
                BackendDecl::Declared { kind, id, endpoint, api_key, default_model, enabled } => {
                    let backend = create_backend(
                        kind,
                        id,
                        &endpoint,
                        api_key,
                        default_model,
                        enabled,
                        self.settings.task_timeout,
                    )?;
                    registry.register(backend);
                }
                BackendDecl::Custom(backend) => registry.register(backend),
            }
        }

        if registry.is_empty() {
            warn!("Engine built with no backends registered; all generation tasks will fail");
        }

        let backends = Arc::new(registry);
        let groups = Arc::new(ModelGroupRegistry::new());

        for spec in self.group_specs {
            for model in &spec.models {
                if !backends.contains(model) {
                    warn!(
                        "Model group '{}' references unregistered backend '{}'",
                        spec.name, model
                    );
                }
            }
            groups.create(spec).await?;
        }

        let router = Arc::new(ModelRouter::new(groups.clone()));
        let store = Arc::new(JobStore::new());
        let worker = Arc::new(WorkerPool::new(
            store.clone(),
            router.clone(),
            backends.clone(),
            self.settings.clone(),
        ));
        let queue = JobQueueManager::start(store.clone(), worker, self.settings.clone());

        debug!(
            "Engine ready (max {} articles/job, {} tasks/job, {}s deadline)",
            self.settings.max_articles_per_job,
            self.settings.task_concurrency,
            self.settings.task_timeout.as_secs()
        );

        Ok(GenerationEngine { store, queue, groups, backends, router })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
