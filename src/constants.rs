// Scheduler
pub const DEFAULT_MAX_ARTICLES_PER_JOB: u32 = 50;
pub const DEFAULT_TASK_CONCURRENCY: usize = 5;
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 120;

// Generation defaults
pub const DEFAULT_WORD_COUNT: u32 = 1200;
pub const DEFAULT_TONE: &str = "Professional";

// Backends
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const OPENAI_API_ENDPOINT: &str = "https://api.openai.com/v1";
pub const PROBE_TIMEOUT_SECS: u64 = 5;

// Config export/import
pub const BUNDLE_VERSION: &str = "1";
