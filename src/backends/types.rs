use serde::{Serialize, Deserialize};

/// Kind of inference service a backend speaks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    OpenAI,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Ollama => write!(f, "ollama"),
            BackendKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// A single generation call against a backend
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl BackendRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        BackendRequest {
            prompt: prompt.into(),
            system: None,
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// What a backend returned for one generation call
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendResponse {
    pub content: String,
    pub model: String,
}

/// A model the backend reports as available
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}
