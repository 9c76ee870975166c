use std::collections::HashMap;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use serde::{Serialize, Deserialize};

/// Privilege level attached to a caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Superadmin,
}

/// Authenticated caller identity, as handed to the scheduler core.
///
/// How tokens are issued and verified is external; the engine only
/// consumes the resulting identity and role.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }
}

/// Maps bearer tokens to caller identities
pub trait TokenAuthenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Caller>;
}

/// Fixed token table; suitable for tests and single-node deployments
/// where tokens are provisioned out of band.
#[derive(Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self { tokens: HashMap::new() }
    }

    pub fn with_token(mut self, token: impl Into<String>, caller: Caller) -> Self {
        self.tokens.insert(token.into(), caller);
        self
    }
}

impl TokenAuthenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<Caller> {
        self.tokens.get(token).cloned()
    }
}

/// Extract the bearer token from an Authorization header, if present and
/// well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
