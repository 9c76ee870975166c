use crate::backends::types::{BackendKind, BackendRequest, BackendResponse, ModelInfo};
use crate::backends::ollama::OllamaBackend;
use crate::backends::openai::OpenAIBackend;
use crate::errors::{ForgeError, ForgeResult};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Interface every model backend implements
///
/// A backend wraps one reachable inference service. The worker pool calls
/// `generate` for each task; the admin surface uses `probe`, `list_models`
/// and `pull_model`.
#[async_trait]
pub trait GenerationBackend {
    /// Run one generation call to completion.
    async fn generate(&self, request: &BackendRequest) -> ForgeResult<BackendResponse>;

    /// Cheap reachability check. Returns a short human-readable summary of
    /// what the service reported.
    async fn probe(&self) -> ForgeResult<String>;

    /// Enumerate the models the service reports as installed/available.
    async fn list_models(&self) -> ForgeResult<Vec<ModelInfo>>;

    /// Ask the service to download a model image. Backends without a pull
    /// API reject this with a validation error.
    async fn pull_model(&self, model: &str) -> ForgeResult<()> {
        let _ = model;
        Err(ForgeError::Validation(format!(
            "backend '{}' does not support pulling models",
            self.id()
        )))
    }

    fn id(&self) -> &str;
    fn kind(&self) -> BackendKind;
    fn default_model(&self) -> &str;
    fn is_enabled(&self) -> bool;
}

/// Shared plumbing for concrete backends: identity, endpoint, credentials
/// and a reqwest client with the task deadline applied at the HTTP layer.
pub struct BaseBackend {
    id: String,
    client: Client,
    endpoint: Url,
    api_key: String,
    default_model: String,
    enabled: bool,
}

impl BaseBackend {
    pub fn new(
        id: String,
        endpoint: &str,
        api_key: String,
        default_model: String,
        enabled: bool,
        request_timeout: Duration,
    ) -> ForgeResult<Self> {
        // A trailing slash keeps Url::join from eating the last path
        // segment of endpoints like "https://host/v1".
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{}/", endpoint)
        };
        let endpoint = Url::parse(&normalized).map_err(|e| {
            ForgeError::Config(format!("invalid endpoint '{}' for backend '{}': {}", endpoint, id, e))
        })?;

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ForgeError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { id, client, endpoint, api_key, default_model, enabled })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Join a path onto the backend endpoint.
    pub fn url(&self, path: &str) -> ForgeResult<Url> {
        self.endpoint
            .join(path)
            .map_err(|e| ForgeError::Internal(format!("bad url path '{}': {}", path, e)))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Construct a backend of the given kind behind the trait object the
/// registry stores.
pub fn create_backend(
    kind: BackendKind,
    id: String,
    endpoint: &str,
    api_key: String,
    default_model: String,
    enabled: bool,
    request_timeout: Duration,
) -> ForgeResult<Arc<dyn GenerationBackend + Send + Sync>> {
    let base = BaseBackend::new(id, endpoint, api_key, default_model, enabled, request_timeout)?;
    match kind {
        BackendKind::Ollama => Ok(Arc::new(OllamaBackend::new(base))),
        BackendKind::OpenAI => Ok(Arc::new(OpenAIBackend::new(base))),
    }
}
