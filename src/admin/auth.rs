//! Shared-secret header check for the admin API.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admin::handlers::error_body;
use crate::admin::AdminState;

/// Rejects every request whose admin header does not carry the configured
/// token, before routing.
pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(state.config.header.as_str())
        .and_then(|h| h.to_str().ok());

    if provided == Some(state.config.token.as_str()) {
        return next.run(request).await;
    }

    tracing::warn!(
        path = %request.uri().path(),
        header = %state.config.header,
        "Admin request rejected"
    );
    (StatusCode::UNAUTHORIZED, error_body("unauthorized")).into_response()
}
