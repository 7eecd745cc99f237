//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → store.rs (scan routes in registration order under a read lock)
//!     → matcher.rs (evaluate method + path conditions)
//!     → Return: deep copy of the first matching RouteDefinition, or NotFound
//!
//! Administrative mutation:
//!     add / update / delete
//!     → store.rs (exclusive write lock, whole table)
//!     → readers observe either the old or the new table, never a mix
//! ```
//!
//! # Design Decisions
//! - First match wins (registration order), not best match
//! - Path matching is exact, or prefix when the pattern ends in `*`
//! - Method matching is case-insensitive; empty method matches any
//! - Every definition crossing the store boundary is an owned clone

pub mod matcher;
pub mod route;
pub mod store;

pub use route::{RouteDefinition, Template};
pub use store::{RouteError, RouteStore};
