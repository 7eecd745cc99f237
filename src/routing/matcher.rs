//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request method (case-insensitive, empty = any)
//! - Match the request path (exact, or prefix for `*` patterns)
//! - Combine both conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - An empty path pattern never matches
//! - No regex to guarantee O(n) matching

use crate::routing::route::RouteDefinition;

/// Trait for matching a request line against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, method: &str, path: &str) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone, Copy)]
pub struct MethodMatcher<'a> {
    expected: &'a str,
}

impl<'a> MethodMatcher<'a> {
    pub fn new(expected: &'a str) -> Self {
        Self { expected }
    }
}

impl Matcher for MethodMatcher<'_> {
    fn matches(&self, method: &str, _path: &str) -> bool {
        self.expected.is_empty() || self.expected.eq_ignore_ascii_case(method)
    }
}

/// Matches the request path against a literal or `prefix*` pattern.
#[derive(Debug, Clone, Copy)]
pub enum PathMatcher<'a> {
    Exact(&'a str),
    Prefix(&'a str),
    Never,
}

impl<'a> PathMatcher<'a> {
    pub fn new(pattern: &'a str) -> Self {
        if pattern.is_empty() {
            PathMatcher::Never
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            PathMatcher::Prefix(prefix)
        } else {
            PathMatcher::Exact(pattern)
        }
    }
}

impl Matcher for PathMatcher<'_> {
    fn matches(&self, _method: &str, path: &str) -> bool {
        match self {
            PathMatcher::Exact(expected) => *expected == path,
            PathMatcher::Prefix(prefix) => path.starts_with(prefix),
            PathMatcher::Never => false,
        }
    }
}

impl Matcher for RouteDefinition {
    fn matches(&self, method: &str, path: &str) -> bool {
        MethodMatcher::new(&self.method).matches(method, path)
            && PathMatcher::new(&self.path).matches(method, path)
    }
}
