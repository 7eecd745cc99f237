//! Per-request mutable context shared by every stage and hook.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

/// Mutable state of one in-flight HTTP exchange.
///
/// Created by the pipeline for a single request and dropped when the
/// response is written. Header names are stored lower-case.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_headers: HashMap<String, String>,
    pub request_body: Vec<u8>,
    pub response_headers: HashMap<String, String>,
    pub response_body: Vec<u8>,
    /// Open-ended facts exposed to scripts and to the `@ctx.` accessor.
    pub data: Map<String, Value>,
    /// Message of the failure currently being reported, if any.
    pub error: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&mut self, error: &impl std::fmt::Display) {
        self.error = Some(error.to_string());
    }

    /// Look up a request header by (case-insensitive) name.
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The view handed to scripts as the `context` binding.
    pub fn to_script_value(&self) -> Value {
        json!({
            "requestBody": String::from_utf8_lossy(&self.request_body),
            "responseBody": String::from_utf8_lossy(&self.response_body),
            "requestHeaders": self.request_headers,
            "responseHeaders": self.response_headers,
            "data": self.data,
            "error": self.error,
        })
    }

    /// Apply a script's `context` binding back onto this context.
    ///
    /// Bodies are replaced when the script changed their text. Header maps
    /// are merged key by key; only string values are taken. The data bag is
    /// replaced when the view carries an object under `data`; script hooks
    /// leave the key out when the bag is unchanged. `error` is ignored.
    pub fn apply_script_value(&mut self, value: Value) {
        let Value::Object(mut view) = value else {
            return;
        };

        if let Some(Value::String(body)) = view.remove("requestBody") {
            replace_body(&mut self.request_body, body);
        }
        if let Some(Value::String(body)) = view.remove("responseBody") {
            replace_body(&mut self.response_body, body);
        }
        if let Some(headers) = view.remove("requestHeaders") {
            merge_headers(&mut self.request_headers, headers);
        }
        if let Some(headers) = view.remove("responseHeaders") {
            merge_headers(&mut self.response_headers, headers);
        }
        if let Some(Value::Object(data)) = view.remove("data") {
            self.data = data;
        }
    }
}

// Untouched non-UTF-8 bodies survive the lossy text round trip.
fn replace_body(body: &mut Vec<u8>, text: String) {
    if *String::from_utf8_lossy(body) != *text {
        *body = text.into_bytes();
    }
}

fn merge_headers(target: &mut HashMap<String, String>, headers: Value) {
    let Value::Object(headers) = headers else {
        return;
    };
    for (name, value) in headers {
        if let Value::String(value) = value {
            target.insert(name.to_ascii_lowercase(), value);
        }
    }
}
