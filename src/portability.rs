//! Export and import of routing configuration as a versioned bundle.
//!
//! A bundle is a point-in-time snapshot of every model group and named
//! configuration. Import is all-or-nothing: the bundle is validated in
//! full before any change is applied, so a bad bundle never leaves the
//! registry half-updated.

use crate::constants::BUNDLE_VERSION;
use crate::errors::{ForgeError, ForgeResult};
use crate::router::{ModelGroup, ModelGroupRegistry, NamedConfiguration};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Serialize, Deserialize};

/// Versioned snapshot of the model group registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub model_groups: Vec<ModelGroup>,
    pub configurations: Vec<NamedConfiguration>,
}

/// Result of applying a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub model_groups: usize,
    pub configurations: usize,
}

/// Snapshot the registry into a bundle. Groups and configurations are
/// emitted sorted by name so repeated exports of the same state are
/// byte-identical apart from the timestamp.
pub async fn export(registry: &ModelGroupRegistry) -> ConfigBundle {
    let model_groups = registry.list(None).await;
    let configurations = registry.configurations().await;

    ConfigBundle {
        version: BUNDLE_VERSION.to_string(),
        exported_at: Utc::now(),
        model_groups,
        configurations,
    }
}

/// Validate and apply a bundle. Every group and configuration it names is
/// upserted, or none are.
pub async fn import(registry: &ModelGroupRegistry, bundle: ConfigBundle) -> ForgeResult<ImportSummary> {
    if bundle.version != BUNDLE_VERSION {
        return Err(ForgeError::Validation(format!(
            "unsupported bundle version '{}' (expected '{}')",
            bundle.version, BUNDLE_VERSION
        )));
    }

    let group_count = bundle.model_groups.len();
    let configuration_count = bundle.configurations.len();

    registry.apply_bundle(bundle.model_groups, bundle.configurations).await?;

    info!(
        "Imported bundle: {} model groups, {} configurations",
        group_count, configuration_count
    );
    Ok(ImportSummary {
        model_groups: group_count,
        configurations: configuration_count,
    })
}
