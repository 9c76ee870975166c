//! Shared test support: scriptable in-process backends and engine setup.

#![allow(dead_code)]

use articleforge::{
    BackendKind, BackendRequest, BackendResponse, ForgeError, ForgeResult,
    GenerationBackend, GenerationEngine, GroupSpec, JobMode, JobRequest, ModelInfo,
    RoutingStrategy,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Backend that generates instantly (modulo an optional delay) and fails
/// any prompt containing the configured marker.
pub struct MockBackend {
    id: String,
    delay: Duration,
    fail_marker: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            delay: Duration::ZERO,
            fail_marker: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn with_delay(id: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            delay,
            fail_marker: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn with_fail_marker(id: &str, marker: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            delay: Duration::ZERO,
            fail_marker: Some(marker.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn with_delay_and_marker(id: &str, delay: Duration, marker: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            delay,
            fail_marker: Some(marker.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, request: &BackendRequest) -> ForgeResult<BackendResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(request.prompt.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(ref marker) = self.fail_marker {
            if request.prompt.contains(marker) {
                return Err(ForgeError::Internal("synthetic generation failure".to_string()));
            }
        }

        Ok(BackendResponse {
            content: "Generated article body.".to_string(),
            model: "mock-model".to_string(),
        })
    }

    async fn probe(&self) -> ForgeResult<String> {
        Ok("1 models available".to_string())
    }

    async fn list_models(&self) -> ForgeResult<Vec<ModelInfo>> {
        Ok(vec![ModelInfo { name: "mock-model".to_string(), size_bytes: None }])
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Backend whose service is unreachable; every operation reports
/// unavailability.
pub struct UnreachableBackend {
    id: String,
}

impl UnreachableBackend {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self { id: id.to_string() })
    }
}

#[async_trait]
impl GenerationBackend for UnreachableBackend {
    async fn generate(&self, _request: &BackendRequest) -> ForgeResult<BackendResponse> {
        Err(ForgeError::BackendUnavailable("connection refused".to_string()))
    }

    async fn probe(&self) -> ForgeResult<String> {
        Err(ForgeError::BackendUnavailable("connection refused".to_string()))
    }

    async fn list_models(&self) -> ForgeResult<Vec<ModelInfo>> {
        Err(ForgeError::BackendUnavailable("connection refused".to_string()))
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn default_model(&self) -> &str {
        "unreachable-model"
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Engine wired to a single mock backend behind a round-robin group named
/// "default".
pub async fn engine_with_backend(
    backend: Arc<dyn GenerationBackend + Send + Sync>,
) -> Arc<GenerationEngine> {
    let backend_id = backend.id().to_string();
    let engine = GenerationEngine::builder()
        .register_backend(backend)
        .define_group(GroupSpec {
            name: "default".to_string(),
            description: String::new(),
            models: vec![backend_id],
            strategy: RoutingStrategy::RoundRobin,
            weights: None,
            is_active: true,
        })
        .default_model_group("default")
        .build()
        .await
        .unwrap();
    Arc::new(engine)
}

/// A topic-mode request over the given topics, one article per topic.
pub fn topic_request(topics: &[&str]) -> JobRequest {
    JobRequest {
        mode: JobMode::Topic,
        article_count: topics.len() as u32,
        topics: topics.iter().map(|t| t.to_string()).collect(),
        word_count: 1200,
        tone: "Professional".to_string(),
        keywords: vec![],
        spin_source: None,
        spin_angle: None,
        spin_intensity: "medium".to_string(),
        trend_region: None,
        model_group: None,
    }
}

/// Poll until the job reaches a terminal state.
pub async fn wait_for_terminal(
    engine: &GenerationEngine,
    job_id: &str,
    owner_id: &str,
) -> articleforge::GenerationJob {
    for _ in 0..500 {
        let job = engine.get_job(job_id, owner_id).await.unwrap();
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job '{}' did not reach a terminal state in time", job_id);
}
