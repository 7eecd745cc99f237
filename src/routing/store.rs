//! Route lookup and dynamic route management.
//!
//! # Responsibilities
//! - Store route definitions in registration order
//! - Look up the first route matching a request
//! - Add, update and delete routes at runtime
//! - Resolve the backend URL, path and method for a request
//!
//! # Design Decisions
//! - One reader/writer lock scoped to the whole table
//! - Writes are rare (admin API), reads happen on every request
//! - Definitions are cloned on every read and write, so callers never hold
//!   a reference into the table and no lock is held during script or
//!   template execution
//! - Explicit NotFound rather than silent default; the caller decides
//!   whether a miss is fatal

use parking_lot::RwLock;
use thiserror::Error;

use crate::routing::matcher::Matcher;
use crate::routing::route::RouteDefinition;

/// Errors returned by route store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route already exists: {method} {path}")]
    Conflict { method: String, path: String },

    #[error("route not found: {method} {path}")]
    NotFound { method: String, path: String },
}

impl RouteError {
    fn conflict(route: &RouteDefinition) -> Self {
        RouteError::Conflict {
            method: route.method.clone(),
            path: route.path.clone(),
        }
    }

    fn not_found(method: &str, path: &str) -> Self {
        RouteError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        }
    }
}

/// Concurrent-safe, ordered routing table.
#[derive(Debug)]
pub struct RouteStore {
    routes: RwLock<Vec<RouteDefinition>>,
    default_backend: String,
}

impl RouteStore {
    /// Create a store seeded with `routes`, falling back to `default_backend`
    /// when a route carries no backend URL of its own.
    pub fn new(routes: Vec<RouteDefinition>, default_backend: impl Into<String>) -> Self {
        Self {
            routes: RwLock::new(routes),
            default_backend: default_backend.into(),
        }
    }

    /// Find the first route (in registration order) matching the request.
    pub fn match_route(&self, method: &str, path: &str) -> Result<RouteDefinition, RouteError> {
        let routes = self.routes.read();
        routes
            .iter()
            .find(|route| route.matches(method, path))
            .cloned()
            .ok_or_else(|| RouteError::not_found(method, path))
    }

    /// Append a route. Fails if a route with the same key exists.
    pub fn add(&self, route: RouteDefinition) -> Result<(), RouteError> {
        let mut routes = self.routes.write();
        if routes.iter().any(|r| r.same_key(&route.path, &route.method)) {
            return Err(RouteError::conflict(&route));
        }
        tracing::info!(method = %route.method, path = %route.path, "Route added");
        routes.push(route);
        Ok(())
    }

    /// Replace the route with the same key, keeping its position.
    pub fn update(&self, route: RouteDefinition) -> Result<(), RouteError> {
        let mut routes = self.routes.write();
        let slot = routes
            .iter_mut()
            .find(|r| r.same_key(&route.path, &route.method))
            .ok_or_else(|| RouteError::not_found(&route.method, &route.path))?;
        tracing::info!(method = %route.method, path = %route.path, "Route updated");
        *slot = route;
        Ok(())
    }

    /// Remove the route identified by `(path, method)`.
    pub fn delete(&self, path: &str, method: &str) -> Result<(), RouteError> {
        let mut routes = self.routes.write();
        let index = routes
            .iter()
            .position(|r| r.same_key(path, method))
            .ok_or_else(|| RouteError::not_found(method, path))?;
        routes.remove(index);
        tracing::info!(method = %method, path = %path, "Route deleted");
        Ok(())
    }

    /// Copies of all routes, in registration order.
    pub fn list(&self) -> Vec<RouteDefinition> {
        self.routes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// The configured default backend base URL.
    pub fn default_backend(&self) -> &str {
        &self.default_backend
    }

    /// Backend base URL for a request: the route's override, else the default.
    pub fn resolve_backend_url(&self, route: Option<&RouteDefinition>) -> String {
        match route {
            Some(r) if !r.backend_url.is_empty() => r.backend_url.clone(),
            _ => self.default_backend.clone(),
        }
    }

    /// Backend path for a request: the route's override, else the inbound path.
    pub fn resolve_backend_path(&self, route: Option<&RouteDefinition>, original: &str) -> String {
        match route {
            Some(r) if !r.backend_path.is_empty() => r.backend_path.clone(),
            _ => original.to_string(),
        }
    }

    /// Backend method for a request: the route's override, else the inbound method.
    pub fn resolve_backend_method(&self, route: Option<&RouteDefinition>, original: &str) -> String {
        match route {
            Some(r) if !r.backend_method.is_empty() => r.backend_method.clone(),
            _ => original.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::thread;

    fn route_with_template(method: &str, path: &str, template: Value) -> RouteDefinition {
        let mut route = RouteDefinition::new(method, path);
        route.response_transform = template.as_object().cloned();
        route
    }

    #[test]
    fn test_first_match_wins() {
        let mut broad = RouteDefinition::new("", "/api/*");
        broad.backend_url = "http://broad".into();
        let mut specific = RouteDefinition::new("GET", "/api/users");
        specific.backend_url = "http://specific".into();

        let store = RouteStore::new(vec![broad, specific], "http://default");
        let matched = store.match_route("GET", "/api/users").unwrap();
        assert_eq!(matched.backend_url, "http://broad");
    }

    #[test]
    fn test_wildcard_and_miss() {
        let store = RouteStore::new(vec![RouteDefinition::new("", "/api/*")], "http://default");
        assert!(store.match_route("GET", "/api/anything/here").is_ok());
        assert_eq!(
            store.match_route("GET", "/apiX"),
            Err(RouteError::NotFound {
                method: "GET".into(),
                path: "/apiX".into()
            })
        );
    }

    #[test]
    fn test_add_duplicate_conflicts() {
        let store = RouteStore::new(Vec::new(), "http://default");
        let mut route = RouteDefinition::new("POST", "/api/users");
        route.backend_url = "http://a".into();
        store.add(route.clone()).unwrap();

        let mut other = RouteDefinition::new("post", "/api/users");
        other.backend_url = "http://b".into();
        assert!(matches!(store.add(other), Err(RouteError::Conflict { .. })));
        assert_eq!(store.len(), 1);

        // Same path, different method is a distinct key.
        store.add(RouteDefinition::new("GET", "/api/users")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_preserves_position() {
        let store = RouteStore::new(
            vec![
                RouteDefinition::new("GET", "/a"),
                RouteDefinition::new("GET", "/b"),
                RouteDefinition::new("GET", "/c"),
            ],
            "http://default",
        );

        let mut updated = RouteDefinition::new("GET", "/b");
        updated.backend_path = "/v2/b".into();
        store.update(updated).unwrap();

        let routes = store.list();
        assert_eq!(routes[1].path, "/b");
        assert_eq!(routes[1].backend_path, "/v2/b");

        let missing = RouteDefinition::new("GET", "/zzz");
        assert!(matches!(store.update(missing), Err(RouteError::NotFound { .. })));
    }

    #[test]
    fn test_delete() {
        let store = RouteStore::new(
            vec![RouteDefinition::new("GET", "/a"), RouteDefinition::new("GET", "/b")],
            "http://default",
        );
        store.delete("/a", "get").unwrap();
        assert_eq!(store.list(), vec![RouteDefinition::new("GET", "/b")]);
        assert!(matches!(store.delete("/a", "GET"), Err(RouteError::NotFound { .. })));
    }

    #[test]
    fn test_match_returns_independent_copies() {
        let store = RouteStore::new(
            vec![route_with_template(
                "GET",
                "/api/test",
                json!({"code": "200", "data": {"value": "$.result"}}),
            )],
            "http://default",
        );

        let mut first = store.match_route("GET", "/api/test").unwrap();
        let second = store.match_route("GET", "/api/test").unwrap();

        let template = first.response_transform.as_mut().unwrap();
        template.insert("code".into(), json!("500"));
        template["data"]["value"] = json!("mutated");
        template.insert("new_field".into(), json!("added"));

        let untouched = second.response_transform.as_ref().unwrap();
        assert_eq!(untouched["code"], "200");
        assert_eq!(untouched["data"]["value"], "$.result");
        assert!(!untouched.contains_key("new_field"));

        let stored = store.list().remove(0);
        assert_eq!(stored.response_transform.unwrap()["code"], "200");
    }

    #[test]
    fn test_resolve_backend() {
        let store = RouteStore::new(Vec::new(), "http://default");
        let mut route = RouteDefinition::new("GET", "/a");

        assert_eq!(store.resolve_backend_url(Some(&route)), "http://default");
        assert_eq!(store.resolve_backend_path(Some(&route), "/a"), "/a");
        assert_eq!(store.resolve_backend_method(Some(&route), "GET"), "GET");

        route.backend_url = "http://override".into();
        route.backend_path = "/internal/a".into();
        route.backend_method = "POST".into();
        assert_eq!(store.resolve_backend_url(Some(&route)), "http://override");
        assert_eq!(store.resolve_backend_path(Some(&route), "/a"), "/internal/a");
        assert_eq!(store.resolve_backend_method(Some(&route), "GET"), "POST");

        assert_eq!(store.resolve_backend_url(None), "http://default");
        assert_eq!(store.resolve_backend_path(None, "/x"), "/x");
    }

    #[test]
    fn test_concurrent_match_and_update() {
        let store = Arc::new(RouteStore::new(
            vec![route_with_template(
                "GET",
                "/api/test",
                json!({"code": "200", "data": "$.result"}),
            )],
            "http://default",
        ));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    let route = store.match_route("GET", "/api/test").unwrap();
                    let template = route.response_transform.unwrap();
                    // Either the original or an updated snapshot, never a mix.
                    match template.get("index") {
                        None => {
                            assert_eq!(template["data"], "$.result");
                            assert!(!template.contains_key("message"));
                        }
                        Some(index) => {
                            assert_eq!(template["message"], format!("updated-{}", index));
                            assert!(!template.contains_key("data"));
                        }
                    }
                    assert_eq!(store.list().len(), 1);
                }
            }));
        }
        for i in 0..4 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    store
                        .update(route_with_template(
                            "GET",
                            "/api/test",
                            json!({"code": "200", "message": format!("updated-{}", i), "index": i}),
                        ))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 1);
    }
}
