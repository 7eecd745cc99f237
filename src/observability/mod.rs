//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (request_id, method, path, hook_point, backend)
//!     → tower-http TraceLayer spans per HTTP request
//!
//! Consumers:
//!     → logging.rs (fmt subscriber to stdout, EnvFilter)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all subsystems
//! - Log level configurable via config and environment

pub mod logging;

pub use logging::init_tracing;
