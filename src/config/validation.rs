//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs
//! - Detect duplicate routes
//! - Check hook entries name exactly one script origin
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_backend_url(&mut errors, "backend.default_url", &config.backend.default_url);

    if config.auth.token.is_empty() {
        errors.push(ValidationError::new("auth.token", "must not be empty"));
    }

    if config.admin.enabled {
        check_socket_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.token.is_empty() {
            errors.push(ValidationError::new("admin.token", "must not be empty"));
        }
        if config.admin.header.is_empty() {
            errors.push(ValidationError::new("admin.header", "must not be empty"));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than 0"));
    }
    if config.scripting.timeout_ms == 0 {
        errors.push(ValidationError::new("scripting.timeout_ms", "must be greater than 0"));
    }

    for (i, route) in config.routes.iter().enumerate() {
        let field = format!("routes[{i}]");
        if !route.path.starts_with('/') {
            errors.push(ValidationError::new(
                format!("{field}.path"),
                format!("must start with '/', got {:?}", route.path),
            ));
        }
        if !route.backend_url.is_empty() {
            check_backend_url(&mut errors, &format!("{field}.backendUrl"), &route.backend_url);
        }
        let duplicate = config.routes[..i]
            .iter()
            .any(|earlier| earlier.same_key(&route.path, &route.method));
        if duplicate {
            errors.push(ValidationError::new(
                field,
                format!("duplicate route {} {}", route.method, route.path),
            ));
        }
    }

    for (i, hook) in config.hooks.iter().enumerate() {
        if hook.path.is_some() == hook.source.is_some() {
            errors.push(ValidationError::new(
                format!("hooks[{i}]"),
                "exactly one of 'path' or 'source' must be set",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address {value:?}")));
    }
}

fn check_backend_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(_) => errors.push(ValidationError::new(
            field,
            format!("must be an absolute http(s) URL, got {value:?}"),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL {value:?}: {e}"))),
    }
}
