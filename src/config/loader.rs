//! Configuration file loading and environment variable resolution.

use std::env;
use std::fs;
use std::path::Path;
use regex::Regex;

use crate::errors::{ForgeError, ForgeResult};
use super::types::Config;

/// Load and parse a TOML configuration file.
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Returns
/// * `ForgeResult<Config>` - Parsed configuration with environment variables resolved
pub fn load_config<P: AsRef<Path>>(path: P) -> ForgeResult<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        ForgeError::Config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&content)
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> ForgeResult<Config> {
    let mut config: Config = toml::from_str(content).map_err(|e| {
        ForgeError::Config(format!("Failed to parse TOML: {}", e))
    })?;

    resolve_env_vars(&mut config)?;
    validate_config(&config)?;

    Ok(config)
}

/// Resolve environment variable references in the configuration.
///
/// Environment variables are specified using the `${VAR_NAME}` syntax.
/// If a variable is not found, an error is returned with a helpful message.
fn resolve_env_vars(config: &mut Config) -> ForgeResult<()> {
    let env_var_pattern = Regex::new(r"\$\{([^}]+)\}").unwrap();

    for (idx, backend) in config.backends.iter_mut().enumerate() {
        if let Some(resolved) =
            resolve_env_var_string(&backend.api_key, &env_var_pattern, &format!("backends[{}].api_key", idx))?
        {
            backend.api_key = resolved;
        }

        if let Some(ref endpoint) = backend.endpoint {
            if let Some(resolved) =
                resolve_env_var_string(endpoint, &env_var_pattern, &format!("backends[{}].endpoint", idx))?
            {
                backend.endpoint = Some(resolved);
            }
        }
    }

    Ok(())
}

/// Resolve environment variables in a single string.
/// Returns None if no env vars are present, Some(resolved) otherwise.
fn resolve_env_var_string(s: &str, pattern: &Regex, location: &str) -> ForgeResult<Option<String>> {
    if !pattern.is_match(s) {
        return Ok(None);
    }

    let mut result = s.to_string();

    for caps in pattern.captures_iter(s) {
        let full_match = caps.get(0).unwrap().as_str();
        let var_name = caps.get(1).unwrap().as_str();

        match env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                return Err(ForgeError::Config(format!(
                    "Environment variable '{}' not found\n  \
                     → Referenced in {}\n  \
                     → Set it with: export {}=\"your-value\"",
                    var_name, location, var_name
                )));
            }
        }
    }

    Ok(Some(result))
}

/// Validate the configuration for consistency.
fn validate_config(config: &Config) -> ForgeResult<()> {
    let valid_kinds = ["ollama", "openai"];

    for (idx, backend) in config.backends.iter().enumerate() {
        let kind = backend.kind.to_lowercase();
        if !valid_kinds.contains(&kind.as_str()) {
            return Err(ForgeError::Config(format!(
                "Unknown backend kind '{}' in backends[{}]\n  \
                 → Valid kinds: {}",
                backend.kind,
                idx,
                valid_kinds.join(", ")
            )));
        }
    }

    let declared_backends: Vec<&str> = config.backends.iter().map(|b| b.id.as_str()).collect();
    let valid_strategies = ["round-robin", "priority"];

    for group in &config.model_groups {
        let strategy = group.strategy.to_lowercase();
        if !valid_strategies.contains(&strategy.as_str()) {
            return Err(ForgeError::Config(format!(
                "Unknown strategy '{}' in model group '{}'\n  \
                 → Valid strategies: {}",
                group.strategy,
                group.name,
                valid_strategies.join(", ")
            )));
        }

        if group.models.is_empty() {
            return Err(ForgeError::Config(format!(
                "Model group '{}' lists no backends\n  \
                 → Add at least one backend id to its models list",
                group.name
            )));
        }

        for model in &group.models {
            if !declared_backends.contains(&model.as_str()) {
                return Err(ForgeError::Config(format!(
                    "Backend '{}' referenced by model group '{}' is not declared\n  \
                     → Declare it in a [[backends]] section or remove it from the group",
                    model, group.name
                )));
            }
        }

        if strategy == "priority" {
            match &group.weights {
                None => {
                    return Err(ForgeError::Config(format!(
                        "Model group '{}' uses the priority strategy but defines no weights",
                        group.name
                    )));
                }
                Some(weights) if weights.len() != group.models.len() => {
                    return Err(ForgeError::Config(format!(
                        "Model group '{}' defines {} weights for {} backends",
                        group.name,
                        weights.len(),
                        group.models.len()
                    )));
                }
                Some(weights) if weights.iter().any(|w| *w == 0) => {
                    return Err(ForgeError::Config(format!(
                        "Model group '{}' weights must all be positive",
                        group.name
                    )));
                }
                Some(_) => {}
            }
        }
    }

    if let Some(ref default_group) = config.scheduler.default_model_group {
        if !config.model_groups.iter().any(|g| &g.name == default_group) {
            return Err(ForgeError::Config(format!(
                "Default model group '{}' is not defined\n  \
                 → Define it in a [[model_groups]] section",
                default_group
            )));
        }
    }

    Ok(())
}
