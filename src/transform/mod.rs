//! Declarative JSON transformation subsystem.
//!
//! # Data Flow
//! ```text
//! (source JSON bytes, template, context map)
//!     → dsl.rs (parse source, walk template top-down)
//!         string "@ctx.a.b"  → walk the context map
//!         string "$.a.b"     → path.rs lookup in the current scope
//!         map with json.path → fan out over a source array
//!         map / sequence     → recurse
//!         anything else      → literal
//!     → serialised result JSON bytes
//! ```
//!
//! # Design Decisions
//! - Pure functions, no shared state
//! - Scalar lookups that fail yield null; array directives that fail are errors
//! - Array iteration rebinds the source scope but never the context map
//! - An empty template returns the source bytes untouched

pub mod dsl;
pub mod path;

pub use dsl::{transform, transform_value, transform_with_context, TemplateError};
pub use path::{JsonPath, PathError};
