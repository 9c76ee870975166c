use crate::backends::backend::{GenerationBackend, BaseBackend};
use crate::backends::types::{BackendKind, BackendRequest, BackendResponse, ModelInfo};
use crate::errors::{ForgeError, ForgeResult};

use async_trait::async_trait;
use serde::{Serialize, Deserialize};

/// Backend speaking the Ollama HTTP API (`/api/generate`, `/api/tags`,
/// `/api/pull`).
pub struct OllamaBackend {
    base: BaseBackend,
}

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    model: String,
    response: String,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelTag>,
}

#[derive(Deserialize)]
struct OllamaModelTag {
    name: String,
    size: Option<u64>,
}

#[derive(Serialize)]
struct OllamaPullRequest {
    name: String,
    stream: bool,
}

impl OllamaBackend {
    pub fn new(base: BaseBackend) -> Self {
        Self { base }
    }

    async fn error_from_response(response: reqwest::Response, context: &str) -> ForgeError {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        if status.is_server_error() {
            ForgeError::BackendUnavailable(format!("{}: {} ({})", context, text, status))
        } else {
            ForgeError::Internal(format!("{}: {} ({})", context, text, status))
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, request: &BackendRequest) -> ForgeResult<BackendResponse> {
        if !self.base.is_enabled() {
            return Err(ForgeError::Conflict(format!("backend '{}' is disabled", self.base.id())));
        }

        let model = request.model.clone().unwrap_or_else(|| self.base.default_model().to_string());

        let options = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        let ollama_request = OllamaGenerateRequest {
            model,
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            stream: false,
            options,
        };

        let response = self.base.client()
            .post(self.base.url("api/generate")?)
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Ollama generate failed").await);
        }

        let ollama_response: OllamaGenerateResponse = response.json().await?;

        if ollama_response.response.is_empty() {
            return Err(ForgeError::Internal("Empty response from Ollama".to_string()));
        }

        Ok(BackendResponse {
            content: ollama_response.response,
            model: ollama_response.model,
        })
    }

    async fn probe(&self) -> ForgeResult<String> {
        let response = self.base.client()
            .get(self.base.url("api/tags")?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Ollama probe failed").await);
        }

        let tags: OllamaTagsResponse = response.json().await?;
        Ok(format!("{} models available", tags.models.len()))
    }

    async fn list_models(&self) -> ForgeResult<Vec<ModelInfo>> {
        let response = self.base.client()
            .get(self.base.url("api/tags")?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Ollama tag listing failed").await);
        }

        let tags: OllamaTagsResponse = response.json().await?;
        Ok(tags.models
            .into_iter()
            .map(|m| ModelInfo { name: m.name, size_bytes: m.size })
            .collect())
    }

    async fn pull_model(&self, model: &str) -> ForgeResult<()> {
        let pull_request = OllamaPullRequest {
            name: model.to_string(),
            stream: false,
        };

        let response = self.base.client()
            .post(self.base.url("api/pull")?)
            .json(&pull_request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Ollama pull failed").await);
        }

        Ok(())
    }

    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    fn default_model(&self) -> &str {
        self.base.default_model()
    }

    fn is_enabled(&self) -> bool {
        self.base.is_enabled()
    }
}
