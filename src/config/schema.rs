//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files and
//! environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::hooks::HookPoint;
use crate::routing::RouteDefinition;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway listener configuration.
    pub listener: ListenerConfig,

    /// Default backend used when a route has no override or nothing matches.
    pub backend: BackendConfig,

    /// Static bearer token checked by the auth stage.
    pub auth: AuthConfig,

    /// Administrative API.
    pub admin: AdminConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Script sandbox limits.
    pub scripting: ScriptingConfig,

    /// Hook scripts registered at startup, in order.
    pub hooks: Vec<HookScriptConfig>,

    /// Initial routing table.
    pub routes: Vec<RouteDefinition>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Default backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Absolute base URL (e.g., "http://localhost:9090").
    pub default_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_url: "http://localhost:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Expected bearer token. Requests must send `Authorization: Bearer <token>`.
    pub token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: "default-token".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin listener.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// Shared secret expected in `header`.
    pub token: String,

    /// Header carrying the shared secret.
    pub header: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            token: "CHANGE_ME_IN_PRODUCTION".to_string(),
            header: "X-Admin-Token".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request or response body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Limits applied to every script hook runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptingConfig {
    /// Wall-clock budget for one hook invocation, in milliseconds.
    pub timeout_ms: u64,

    /// Heap limit per script runtime, in MiB.
    pub memory_limit_mb: usize,

    /// Stack limit per script runtime, in KiB.
    pub max_stack_size_kb: usize,
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            memory_limit_mb: 32,
            max_stack_size_kb: 512,
        }
    }
}

/// A script hook registered at startup. Exactly one of `path` and `source`
/// must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HookScriptConfig {
    pub point: HookPoint,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "script_gateway=info,tower_http=info".to_string(),
        }
    }
}
