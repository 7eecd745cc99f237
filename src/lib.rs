//! HTTP API gateway with a dynamic routing table, scriptable hook points and
//! a declarative JSON template language.

pub mod admin;
pub mod config;
pub mod hooks;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod transform;

pub use config::GatewayConfig;
pub use http::{Gateway, GatewayServer};
pub use lifecycle::Shutdown;
