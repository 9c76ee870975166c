use crate::errors::{ForgeError, ForgeResult};
use crate::router::group_registry::ModelGroupRegistry;
use std::sync::Arc;

use log::debug;

/// Resolves one backend per task from a model group.
///
/// The router reads group state and advances only the round-robin cursor;
/// all other group mutation happens through the registry API.
pub struct ModelRouter {
    groups: Arc<ModelGroupRegistry>,
}

impl ModelRouter {
    pub fn new(groups: Arc<ModelGroupRegistry>) -> Self {
        Self { groups }
    }

    /// Pick a backend id for the next task routed through `group_ref`
    /// (a group id or unique name).
    pub async fn resolve(&self, group_ref: &str) -> ForgeResult<String> {
        let group = self.groups.get_by_ref(group_ref).await?;

        if !group.is_active {
            return Err(ForgeError::Conflict(format!(
                "model group '{}' is inactive",
                group.name
            )));
        }

        let index = group.next_index();
        let backend_id = group.models[index].clone();
        debug!(
            "Routed through group '{}' ({}) to backend '{}'",
            group.name, group.strategy, backend_id
        );
        Ok(backend_id)
    }
}
