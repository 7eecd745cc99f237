//! Pipeline failure kinds and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::hooks::{HookError, HookPoint};
use crate::http::forwarder::ForwardError;
use crate::transform::TemplateError;

/// A terminal failure of one pipeline stage.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("{point} hook failed: {source}")]
    Hook {
        point: HookPoint,
        #[source]
        source: HookError,
    },

    #[error("template transform failed: {0}")]
    Template(#[from] TemplateError),

    #[error("forward failed: {0}")]
    Forward(#[from] ForwardError),

    #[error("request body rejected: {0}")]
    RequestBody(String),
}

impl GatewayError {
    pub fn hook(point: HookPoint, source: HookError) -> Self {
        GatewayError::Hook { point, source }
    }

    /// Fixed status per failure kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            GatewayError::Hook { .. } | GatewayError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Forward(_) => StatusCode::BAD_GATEWAY,
            GatewayError::RequestBody(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = match &self {
            GatewayError::AuthenticationFailed => "Unauthorized".to_string(),
            GatewayError::Hook { .. } => "Hook error".to_string(),
            other => other.to_string(),
        };
        (self.status_code(), body).into_response()
    }
}
