use crate::errors::{ForgeError, ForgeResult};
use crate::router::group::{GroupPatch, GroupSpec, ModelGroup};
use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use log::{debug, info};
use serde::{Serialize, Deserialize};
use tokio::sync::RwLock;

/// One named settings entry carried alongside the model groups in a
/// config bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedConfiguration {
    pub name: String,
    pub value: serde_json::Value,
}

/// Registry of model groups plus the named configurations exported with
/// them.
///
/// Groups are keyed by id with a uniqueness constraint on `name`. All
/// mutation goes through the write lock; bundle application stages the
/// full change set before touching the maps so an invalid bundle leaves
/// the registry untouched.
pub struct ModelGroupRegistry {
    groups: RwLock<HashMap<String, ModelGroup>>,
    configurations: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl ModelGroupRegistry {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            configurations: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn create(&self, spec: GroupSpec) -> ForgeResult<ModelGroup> {
        let group = ModelGroup::from_spec(spec)?;

        let mut groups = self.groups.write().await;
        if groups.values().any(|g| g.name == group.name) {
            return Err(ForgeError::Conflict(format!(
                "a model group named '{}' already exists",
                group.name
            )));
        }

        info!("Created model group '{}' ({} backends, {})", group.name, group.models.len(), group.strategy);
        groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    pub async fn get(&self, id: &str) -> ForgeResult<ModelGroup> {
        self.groups
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("model group '{}' does not exist", id)))
    }

    /// Look a group up by id, falling back to its unique name. Config
    /// files and job submissions may reference groups by either.
    pub async fn get_by_ref(&self, group_ref: &str) -> ForgeResult<ModelGroup> {
        let groups = self.groups.read().await;
        if let Some(group) = groups.get(group_ref) {
            return Ok(group.clone());
        }
        groups
            .values()
            .find(|g| g.name == group_ref)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("model group '{}' does not exist", group_ref)))
    }

    pub async fn update(&self, id: &str, patch: GroupPatch) -> ForgeResult<ModelGroup> {
        let mut groups = self.groups.write().await;

        let current = groups
            .get(id)
            .ok_or_else(|| ForgeError::NotFound(format!("model group '{}' does not exist", id)))?;

        // Patch a clone so a failed validation leaves the stored group
        // untouched.
        let mut updated = current.clone();
        updated.apply_patch(patch)?;

        if groups.values().any(|g| g.id != id && g.name == updated.name) {
            return Err(ForgeError::Conflict(format!(
                "a model group named '{}' already exists",
                updated.name
            )));
        }

        debug!("Updated model group '{}'", updated.name);
        groups.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> ForgeResult<()> {
        let mut groups = self.groups.write().await;
        match groups.remove(id) {
            Some(group) => {
                info!("Deleted model group '{}'", group.name);
                Ok(())
            }
            None => Err(ForgeError::NotFound(format!("model group '{}' does not exist", id))),
        }
    }

    /// List groups sorted by name, optionally filtered on the active flag.
    pub async fn list(&self, is_active: Option<bool>) -> Vec<ModelGroup> {
        let groups = self.groups.read().await;
        let mut listed: Vec<ModelGroup> = groups
            .values()
            .filter(|g| is_active.map_or(true, |active| g.is_active == active))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        listed
    }

    pub async fn set_configuration(&self, name: impl Into<String>, value: serde_json::Value) {
        self.configurations.write().await.insert(name.into(), value);
    }

    pub async fn configurations(&self) -> Vec<NamedConfiguration> {
        self.configurations
            .read()
            .await
            .iter()
            .map(|(name, value)| NamedConfiguration { name: name.clone(), value: value.clone() })
            .collect()
    }

    /// Apply an imported change set: every group and configuration is
    /// upserted, or nothing is.
    ///
    /// Groups match existing entries by name (the unique key); a match
    /// keeps the stored id and creation time.
    pub async fn apply_bundle(
        &self,
        bundle_groups: Vec<ModelGroup>,
        bundle_configurations: Vec<NamedConfiguration>,
    ) -> ForgeResult<usize> {
        let mut seen = std::collections::HashSet::new();
        for group in &bundle_groups {
            group.validate()?;
            if !seen.insert(group.name.clone()) {
                return Err(ForgeError::Validation(format!(
                    "bundle contains model group '{}' more than once",
                    group.name
                )));
            }
        }

        let mut groups = self.groups.write().await;
        let mut configurations = self.configurations.write().await;

        // Stage the merged group map before committing anything.
        let mut staged = groups.clone();
        for mut incoming in bundle_groups {
            match groups.values().find(|g| g.name == incoming.name) {
                Some(existing) => {
                    incoming.id = existing.id.clone();
                    incoming.created_at = existing.created_at;
                    incoming.updated_at = Utc::now();
                }
                None => {
                    if incoming.id.is_empty() {
                        incoming.id = uuid::Uuid::new_v4().to_string();
                    }
                }
            }
            staged.insert(incoming.id.clone(), incoming);
        }

        let applied = staged.len();
        *groups = staged;
        for configuration in bundle_configurations {
            configurations.insert(configuration.name, configuration.value);
        }

        info!("Imported configuration bundle ({} model groups now registered)", applied);
        Ok(applied)
    }
}

impl Default for ModelGroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
