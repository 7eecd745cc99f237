//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → gateway.rs (pipeline orchestrator)
//!         request.rs          header normalisation, request facts
//!         middleware/auth     BeforeAuth → token check → AfterAuth
//!         middleware/transform Before/After hook pairs
//!         forwarder.rs        single outbound call
//!         middleware/error    OnError funnel
//!     → error.rs (stage failure → status code)
//!     → Send to client
//! ```

pub mod error;
pub mod forwarder;
pub mod gateway;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::GatewayError;
pub use forwarder::{ForwardError, Forwarder};
pub use gateway::Gateway;
pub use request::X_REQUEST_ID;
pub use server::{serve, AppState, GatewayServer};
