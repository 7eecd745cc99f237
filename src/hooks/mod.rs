//! Hook subsystem: scriptable extension points around the request pipeline.
//!
//! # Data Flow
//! ```text
//! Pipeline stage reaches an extension point
//!     → registry.rs (snapshot the hook list under a read lock)
//!     → each Hook::execute(&mut RequestContext), in registration order
//!         → script.rs: context → JSON → QuickJS `context` binding
//!                      run script → JSON → merge back into RequestContext
//!     → first error stops the point and propagates to the pipeline
//! ```
//!
//! # Design Decisions
//! - Nine fixed extension points (see `point.rs`)
//! - Hooks are synchronous; one call-in/call-out per invocation
//! - A script hook owns one QuickJS runtime, guarded by a mutex, so two
//!   requests never enter the same interpreter at once
//! - The marshalling contract (text bodies, string-map headers, opaque data
//!   bag) lives in `context.rs` and does not depend on the script runtime

pub mod context;
pub mod point;
pub mod registry;
pub mod script;

pub use context::RequestContext;
pub use point::HookPoint;
pub use registry::HookRegistry;
pub use script::ScriptHook;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while registering or executing hooks.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("script execution error: {0}")]
    Script(String),

    #[error("script exceeded its {0} ms time limit")]
    Timeout(u64),

    #[error("invalid hook script: {0}")]
    Compile(String),

    #[error("script runtime initialization failed: {0}")]
    Init(String),

    #[error("failed to read hook script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown hook point: {0}")]
    UnknownPoint(String),

    #[error("{0}")]
    Native(String),
}

/// A unit of user logic attached to an extension point.
pub trait Hook: Send + Sync {
    /// Run against the shared request context. Mutations are visible to
    /// every later hook and pipeline stage.
    fn execute(&self, ctx: &mut RequestContext) -> Result<(), HookError>;
}

/// A hook backed by an in-process Rust closure.
pub struct FnHook<F> {
    f: F,
}

impl<F> Hook for FnHook<F>
where
    F: Fn(&mut RequestContext) -> Result<(), HookError> + Send + Sync,
{
    fn execute(&self, ctx: &mut RequestContext) -> Result<(), HookError> {
        (self.f)(ctx)
    }
}

/// Wrap a closure as a native hook.
pub fn from_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&mut RequestContext) -> Result<(), HookError> + Send + Sync,
{
    FnHook { f }
}
