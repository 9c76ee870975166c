use crate::errors::{ForgeError, ForgeResult};
use crate::router::strategy::{self, RoutingStrategy};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// A named collection of interchangeable model backends sharing one
/// routing strategy.
///
/// `models` holds backend identifiers in a fixed order; the round-robin
/// cursor is an atomic index into that arena and is the only field routing
/// mutates. The cursor is process-local state and is excluded from
/// serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub models: Vec<String>,
    pub strategy: RoutingStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<u32>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip, default)]
    cursor: Arc<AtomicUsize>,
}

fn default_true() -> bool {
    true
}

/// Parameters for creating a model group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub models: Vec<String>,
    pub strategy: RoutingStrategy,
    #[serde(default)]
    pub weights: Option<Vec<u32>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update for a model group; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub models: Option<Vec<String>>,
    pub strategy: Option<RoutingStrategy>,
    pub weights: Option<Vec<u32>>,
    pub is_active: Option<bool>,
}

impl ModelGroup {
    pub fn from_spec(spec: GroupSpec) -> ForgeResult<Self> {
        let now = Utc::now();
        let group = ModelGroup {
            id: Uuid::new_v4().to_string(),
            name: spec.name,
            description: spec.description,
            models: spec.models,
            strategy: spec.strategy,
            weights: spec.weights,
            is_active: spec.is_active,
            created_at: now,
            updated_at: now,
            cursor: Arc::new(AtomicUsize::new(0)),
        };
        group.validate()?;
        Ok(group)
    }

    /// Check the group invariants: non-empty model list, and for the
    /// priority strategy a weight per model, every weight positive.
    pub fn validate(&self) -> ForgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::Validation("group name must not be empty".to_string()));
        }
        if self.models.is_empty() {
            return Err(ForgeError::Validation(format!(
                "group '{}' must reference at least one backend",
                self.name
            )));
        }

        match self.strategy {
            RoutingStrategy::Priority => {
                let weights = self.weights.as_ref().ok_or_else(|| {
                    ForgeError::Validation(format!(
                        "group '{}' uses the priority strategy but defines no weights",
                        self.name
                    ))
                })?;
                if weights.len() != self.models.len() {
                    return Err(ForgeError::Validation(format!(
                        "group '{}' defines {} weights for {} backends",
                        self.name,
                        weights.len(),
                        self.models.len()
                    )));
                }
                if weights.iter().any(|w| *w == 0) {
                    return Err(ForgeError::Validation(format!(
                        "group '{}' weights must all be positive",
                        self.name
                    )));
                }
            }
            RoutingStrategy::RoundRobin => {}
        }

        Ok(())
    }

    /// Pick the next backend index according to the group's strategy.
    pub fn next_index(&self) -> usize {
        match self.strategy {
            RoutingStrategy::RoundRobin => strategy::round_robin_pick(&self.cursor, self.models.len()),
            RoutingStrategy::Priority => {
                // validate() guarantees weights are present and aligned.
                match self.weights.as_ref() {
                    Some(weights) => strategy::weighted_pick(weights),
                    None => strategy::round_robin_pick(&self.cursor, self.models.len()),
                }
            }
        }
    }

    /// Apply a partial patch and re-validate the result. `updated_at` is
    /// bumped; the rotation cursor is preserved.
    pub fn apply_patch(&mut self, patch: GroupPatch) -> ForgeResult<()> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(models) = patch.models {
            self.models = models;
        }
        if let Some(strategy) = patch.strategy {
            self.strategy = strategy;
            if strategy == RoutingStrategy::RoundRobin {
                self.weights = None;
            }
        }
        if let Some(weights) = patch.weights {
            self.weights = Some(weights);
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }

        self.validate()?;
        self.updated_at = Utc::now();
        Ok(())
    }
}
