//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults (`#[serde(default)]` on every section)
//! 2. A config file: the explicit path if given, else `config/gateway.{toml,yaml,json}` when present
//! 3. Environment variables, e.g. `GATEWAY__AUTH__TOKEN=secret`

use std::path::Path;

use config::{Config, Environment, File};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Base name of the config file looked up when no path is given.
pub const DEFAULT_CONFIG_BASENAME: &str = "config/gateway";

const ENV_PREFIX: &str = "GATEWAY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut builder = Config::builder();

    builder = match path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => {
            if !default_file_exists() {
                tracing::warn!(
                    basename = DEFAULT_CONFIG_BASENAME,
                    "No configuration file found, using defaults"
                );
            }
            builder.add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        }
    };

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config: GatewayConfig = builder.build()?.try_deserialize()?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn default_file_exists() -> bool {
    ["toml", "yaml", "yml", "json"]
        .iter()
        .any(|ext| Path::new(&format!("{DEFAULT_CONFIG_BASENAME}.{ext}")).exists())
}
