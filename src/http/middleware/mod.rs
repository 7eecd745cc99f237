//! Pipeline stages that wrap hook points around one piece of built-in policy.
//!
//! These are not tower layers: they run inside the gateway handler against
//! the request's `RequestContext`, in the order the orchestrator calls them.

pub mod auth;
pub mod error;
pub mod transform;

pub use auth::AuthStage;
pub use error::ErrorStage;
pub use transform::TransformStage;
