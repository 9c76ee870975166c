use crate::backends::backend::GenerationBackend;
use crate::backends::types::ModelInfo;
use crate::errors::{ForgeError, ForgeResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use serde::{Serialize, Deserialize};

/// Outcome of a connection test against one backend
///
/// The probe never fails as an operation: unreachable or unknown backends
/// come back as a normal value with `success = false` and the error text
/// filled in.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionProbe {
    pub success: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary row for the admin backend listing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendSummary {
    pub id: String,
    pub kind: String,
    pub default_model: String,
    pub enabled: bool,
}

/// Inventory of callable model backends, keyed by id.
///
/// The set is fixed after engine construction; routing and the worker pool
/// only read from it, so no interior locking is needed.
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn GenerationBackend + Send + Sync>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { backends: BTreeMap::new() }
    }

    /// Register a backend under its id. Replaces any previous entry with
    /// the same id.
    pub fn register(&mut self, backend: Arc<dyn GenerationBackend + Send + Sync>) {
        debug!("Registered backend '{}' ({})", backend.id(), backend.kind());
        self.backends.insert(backend.id().to_string(), backend);
    }

    pub fn get(&self, id: &str) -> ForgeResult<Arc<dyn GenerationBackend + Send + Sync>> {
        self.backends
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("backend '{}' is not registered", id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn list(&self) -> Vec<BackendSummary> {
        self.backends
            .values()
            .map(|b| BackendSummary {
                id: b.id().to_string(),
                kind: b.kind().to_string(),
                default_model: b.default_model().to_string(),
                enabled: b.is_enabled(),
            })
            .collect()
    }

    /// Probe a backend and report reachability plus elapsed time.
    pub async fn test_connection(&self, id: &str) -> ConnectionProbe {
        let start = Instant::now();

        let backend = match self.backends.get(id) {
            Some(backend) => backend,
            None => {
                return ConnectionProbe {
                    success: false,
                    response_time_ms: 0,
                    response: None,
                    error: Some(format!("backend '{}' is not registered", id)),
                };
            }
        };

        match backend.probe().await {
            Ok(summary) => ConnectionProbe {
                success: true,
                response_time_ms: start.elapsed().as_millis() as u64,
                response: Some(summary),
                error: None,
            },
            Err(e) => {
                warn!("Connection test for backend '{}' failed: {}", id, e);
                ConnectionProbe {
                    success: false,
                    response_time_ms: start.elapsed().as_millis() as u64,
                    response: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Enumerate models a backend reports as available.
    pub async fn list_models(&self, id: &str) -> ForgeResult<Vec<ModelInfo>> {
        self.get(id)?.list_models().await
    }

    /// Ask a backend to pull a model image.
    pub async fn pull_model(&self, id: &str, model: &str) -> ForgeResult<()> {
        if model.trim().is_empty() {
            return Err(ForgeError::Validation("model name must not be empty".to_string()));
        }
        self.get(id)?.pull_model(model).await
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
