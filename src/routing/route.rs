//! Route definition data model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A transformation template tree (see `transform::dsl`).
pub type Template = Map<String, Value>;

/// A single routing rule.
///
/// Identity is the `(path, method)` pair, with the method compared
/// case-insensitively. Every `backend_*` field is an optional override; an
/// empty string means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteDefinition {
    /// Literal path, or a prefix pattern ending in `*`.
    pub path: String,

    /// HTTP method to match. Empty matches any method.
    pub method: String,

    /// Backend base URL override.
    pub backend_url: String,

    /// Backend path override.
    pub backend_path: String,

    /// Backend method override.
    pub backend_method: String,

    /// Template applied to the request body before forwarding.
    pub request_transform: Option<Template>,

    /// Template applied to the response body before it is returned.
    pub response_transform: Option<Template>,
}

impl RouteDefinition {
    /// Create a route for `method path` with no overrides.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    /// Returns true if `other` has the same `(path, method)` identity.
    pub fn same_key(&self, path: &str, method: &str) -> bool {
        self.path == path && self.method.eq_ignore_ascii_case(method)
    }

    /// The request template, if one is declared and non-empty.
    pub fn request_template(&self) -> Option<&Template> {
        self.request_transform.as_ref().filter(|t| !t.is_empty())
    }

    /// The response template, if one is declared and non-empty.
    pub fn response_template(&self) -> Option<&Template> {
        self.response_transform.as_ref().filter(|t| !t.is_empty())
    }

    /// Summary exposed to hooks and templates as `route` in the data bag.
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "path": self.path,
            "method": self.method,
            "backendUrl": self.backend_url,
            "backendPath": self.backend_path,
            "backendMethod": self.backend_method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let raw = r#"{
            "path": "/api/*",
            "method": "GET",
            "backendUrl": "http://users:8080",
            "responseTransform": {"name": "$.user.name"}
        }"#;
        let route: RouteDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(route.path, "/api/*");
        assert_eq!(route.backend_url, "http://users:8080");
        assert!(route.backend_path.is_empty());
        assert!(route.request_transform.is_none());
        assert_eq!(
            route.response_template().unwrap()["name"],
            Value::String("$.user.name".into())
        );

        let out = serde_json::to_value(&route).unwrap();
        assert_eq!(out["backendUrl"], "http://users:8080");
        assert!(out["requestTransform"].is_null());
    }

    #[test]
    fn test_key_is_case_insensitive_on_method() {
        let route = RouteDefinition::new("get", "/users");
        assert!(route.same_key("/users", "GET"));
        assert!(!route.same_key("/users/", "GET"));
        assert!(!route.same_key("/users", "POST"));
    }

    #[test]
    fn test_empty_template_is_absent() {
        let mut route = RouteDefinition::new("", "/");
        route.request_transform = Some(Template::new());
        assert!(route.request_template().is_none());
    }
}
