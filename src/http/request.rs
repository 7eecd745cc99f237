//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and propagate it to the response
//! - Normalise inbound headers into the single-valued context map
//! - Extract the request facts exposed to hooks and templates
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - First value wins on multi-valued headers; non UTF-8 values are skipped
//! - Original headers are kept alongside the context map for forwarding

use std::collections::HashMap;

use axum::http::{header, request::Parts, HeaderMap, HeaderName};
use serde_json::{json, Value};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning an `x-request-id` to requests that arrive without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request ID, or `"unknown"` when the ID layer did not run.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Collapse a header map to lower-case names and their first value.
pub fn normalize_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            let value = headers.get(name)?.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

/// The `data.request` entry: `{id, method, path, query, host, header, body}`.
///
/// `body` is the request body parsed as JSON, or null when it is empty or
/// not JSON.
pub fn request_facts(parts: &Parts, headers: &HashMap<String, String>, body: &[u8]) -> Value {
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();

    let parsed_body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(body).unwrap_or(Value::Null)
    };

    json!({
        "id": request_id(&parts.headers),
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query().unwrap_or_default(),
        "host": host,
        "header": headers,
        "body": parsed_body,
    })
}
