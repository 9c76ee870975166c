/// Model backend implementations and inventory
///
/// A backend is one reachable inference service. Two API dialects are
/// supported:
/// - Ollama (`/api/generate`)
/// - OpenAI-compatible chat completions
///
/// The registry holds the inventory the router picks from and exposes the
/// admin-facing probe, model listing and pull operations.

pub mod backend;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod types;

pub use backend::{GenerationBackend, BaseBackend, create_backend};
pub use ollama::OllamaBackend;
pub use openai::OpenAIBackend;
pub use registry::{BackendRegistry, BackendSummary, ConnectionProbe};
pub use types::{BackendKind, BackendRequest, BackendResponse, ModelInfo};
