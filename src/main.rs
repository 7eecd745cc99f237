//! Script gateway binary.
//!
//! ```text
//!   Client ──▶ gateway listener ──▶ Gateway pipeline ──▶ Backend
//!                                    │  routes (RouteStore)
//!                                    │  hooks  (HookRegistry, QuickJS)
//!                                    │  templates (transform DSL)
//!   Operator ──▶ admin listener ─────┘  (mutates routes and hooks)
//! ```

use std::path::PathBuf;

use clap::Parser;

use script_gateway::config::load_config;
use script_gateway::lifecycle::{signals, start, Shutdown};
use script_gateway::observability::init_tracing;

#[derive(Parser)]
#[command(name = "script-gateway", version)]
#[command(about = "HTTP API gateway with scriptable hooks and JSON templates", long_about = None)]
struct Args {
    /// Configuration file (TOML, YAML or JSON). Defaults to config/gateway.*
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_tracing(&config.observability.log_level);

    tracing::info!("script-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        admin_enabled = config.admin.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let running = start(&config, &shutdown).await?;

    tracing::info!(
        address = %running.gateway_addr,
        admin_address = ?running.admin_addr,
        "Listening for connections"
    );

    signals::forward_signals(&shutdown).await;
    running.wait().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
