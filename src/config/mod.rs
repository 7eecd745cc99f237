//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (serde)
//!     + config file (TOML/YAML/JSON, optional)
//!     + GATEWAY__* environment variables
//!     → loader.rs (layer & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; runtime changes go through the admin API
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AuthConfig, BackendConfig, GatewayConfig, HookScriptConfig, LimitsConfig,
    ListenerConfig, ObservabilityConfig, ScriptingConfig, TimeoutConfig,
};
pub use validation::ValidationError;
