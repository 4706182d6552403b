//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use crate::config::schema::RelayServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables consulted for the project id, highest priority first.
pub const PROJECT_ID_VARS: [&str; 2] = ["PUBLIC_SANITY_PROJECT_ID", "SANITY_PROJECT_ID"];

/// Environment variables consulted for the dataset, highest priority first.
pub const DATASET_VARS: [&str; 2] = ["PUBLIC_SANITY_DATASET", "SANITY_DATASET"];

pub const BIND_ADDRESS_VAR: &str = "RELAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<RelayServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => RelayServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read and deserialize a TOML file without validating it.
pub fn parse_file(path: &Path) -> Result<RelayServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay environment-provided values onto `config`.
///
/// Empty variables are ignored so an unset `PUBLIC_` variable falls through
/// to the next candidate.
pub fn apply_env_overrides<F>(config: &mut RelayServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project_id) = first_set(&lookup, &PROJECT_ID_VARS) {
        tracing::debug!(project_id = %project_id, "Project id taken from environment");
        config.relay.project_id = project_id;
    }
    if let Some(dataset) = first_set(&lookup, &DATASET_VARS) {
        tracing::debug!(dataset = %dataset, "Dataset taken from environment");
        config.relay.dataset = dataset;
    }
    if let Some(bind_address) = first_set(&lookup, &[BIND_ADDRESS_VAR]) {
        config.listener.bind_address = bind_address;
    }
}

fn first_set<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(*key))
        .find(|value| !value.trim().is_empty())
}
