use crate::backends::backend::{GenerationBackend, BaseBackend};
use crate::backends::types::{BackendKind, BackendRequest, BackendResponse, ModelInfo};
use crate::errors::{ForgeError, ForgeResult};

use async_trait::async_trait;
use reqwest::header;
use serde::{Serialize, Deserialize};

/// Backend speaking the OpenAI-compatible chat-completions API. Works
/// against api.openai.com or any self-hosted gateway exposing the same
/// surface.
pub struct OpenAIBackend {
    base: BaseBackend,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAIBackend {
    pub fn new(base: BaseBackend) -> Self {
        Self { base }
    }

    fn auth_headers(&self) -> ForgeResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.base.api_key()))
                .map_err(|e| ForgeError::Config(format!("Invalid API key format: {}", e)))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate(&self, request: &BackendRequest) -> ForgeResult<BackendResponse> {
        if !self.base.is_enabled() {
            return Err(ForgeError::Conflict(format!("backend '{}' is disabled", self.base.id())));
        }

        let model = request.model.clone().unwrap_or_else(|| self.base.default_model().to_string());

        let mut messages = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(ChatMessage { role: "system".to_string(), content: system.clone() });
        }
        messages.push(ChatMessage { role: "user".to_string(), content: request.prompt.clone() });

        let chat_request = ChatCompletionRequest {
            model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self.base.client()
            .post(self.base.url("chat/completions")?)
            .headers(self.auth_headers()?)
            .json(&chat_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            if status.is_server_error() {
                return Err(ForgeError::BackendUnavailable(format!("Chat completion failed: {}", text)));
            }
            return Err(ForgeError::Internal(format!("Chat completion failed: {} ({})", text, status)));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ForgeError::Internal("Empty completion from backend".to_string()));
        }

        Ok(BackendResponse { content, model: completion.model })
    }

    async fn probe(&self) -> ForgeResult<String> {
        let response = self.base.client()
            .get(self.base.url("models")?)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ForgeError::BackendUnavailable(format!("Model listing returned {}", status)));
        }

        let listing: ModelListResponse = response.json().await?;
        Ok(format!("{} models available", listing.data.len()))
    }

    async fn list_models(&self) -> ForgeResult<Vec<ModelInfo>> {
        let response = self.base.client()
            .get(self.base.url("models")?)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ForgeError::BackendUnavailable(format!("Model listing returned {}", status)));
        }

        let listing: ModelListResponse = response.json().await?;
        Ok(listing.data
            .into_iter()
            .map(|m| ModelInfo { name: m.id, size_bytes: None })
            .collect())
    }

    fn id(&self) -> &str {
        self.base.id()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::OpenAI
    }

    fn default_model(&self) -> &str {
        self.base.default_model()
    }

    fn is_enabled(&self) -> bool {
        self.base.is_enabled()
    }
}
