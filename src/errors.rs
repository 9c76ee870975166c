use std::error::Error;
use std::fmt;
use serde_json;

/// Custom error types for scheduler and routing operations
#[derive(Debug)]
pub enum ForgeError {
    /// Malformed input (bad article count, empty models list, mismatched weights, ...)
    Validation(String),
    /// Unknown or not-owned job/group/backend
    NotFound(String),
    /// Duplicate group name, cancel on a terminal job, inactive group
    Conflict(String),
    /// Missing or invalid credentials
    Unauthorized,
    /// Authenticated caller lacks the required privilege
    Forbidden,
    /// The external inference service is unreachable
    BackendUnavailable(String),
    /// Error from the HTTP client
    Request(reqwest::Error),
    /// Parsing error
    Parse(String),
    /// Configuration error
    Config(String),
    /// Unexpected fault
    Internal(String),
}

impl fmt::Display for ForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForgeError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ForgeError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ForgeError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ForgeError::Unauthorized => write!(f, "Authentication required"),
            ForgeError::Forbidden => write!(f, "Insufficient privileges"),
            ForgeError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {}", msg),
            ForgeError::Request(err) => write!(f, "Request error: {}", err),
            ForgeError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ForgeError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ForgeError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl Error for ForgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ForgeError::Request(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert reqwest errors to ForgeError
///
/// Connection-level failures map to `BackendUnavailable` so they surface
/// as 503 rather than a generic request error.
impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ForgeError::BackendUnavailable(err.to_string())
        } else {
            ForgeError::Request(err)
        }
    }
}

/// Convert serde_json errors to ForgeError
impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Parse(err.to_string())
    }
}

/// Convert std::io::Error to ForgeError
impl From<std::io::Error> for ForgeError {
    fn from(err: std::io::Error) -> Self {
        ForgeError::Config(err.to_string())
    }
}

/// Convert toml parsing errors to ForgeError
impl From<toml::de::Error> for ForgeError {
    fn from(err: toml::de::Error) -> Self {
        ForgeError::Config(err.to_string())
    }
}

/// Result type alias for scheduler operations
pub type ForgeResult<T> = Result<T, ForgeError>;
