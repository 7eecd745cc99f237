//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route store, hook registry, forwarder and gateway from config
//! - Register configured hook scripts in order
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shared state is constructed here and passed down explicitly
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{GatewayConfig, HookScriptConfig};
use crate::hooks::{HookError, HookPoint, HookRegistry};
use crate::http::{serve, ForwardError, Forwarder, Gateway, GatewayServer};
use crate::lifecycle::Shutdown;
use crate::routing::RouteStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to register {point} hook #{index}: {source}")]
    Hook {
        point: HookPoint,
        index: usize,
        #[source]
        source: HookError,
    },

    #[error("hook #{index} for {point} has neither a path nor a source")]
    EmptyHook { point: HookPoint, index: usize },

    #[error("failed to create backend client: {0}")]
    Forwarder(#[source] ForwardError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Long-lived shared state of a running gateway.
pub struct Services {
    pub routes: Arc<RouteStore>,
    pub hooks: Arc<HookRegistry>,
    pub gateway: Arc<Gateway>,
}

/// Construct the shared state and register configured hooks.
pub fn build_services(config: &GatewayConfig) -> Result<Services, StartupError> {
    let routes = Arc::new(RouteStore::new(
        config.routes.clone(),
        config.backend.default_url.clone(),
    ));
    let hooks = Arc::new(HookRegistry::new(config.scripting.clone()));
    register_configured_hooks(&hooks, &config.hooks)?;

    let forwarder = Forwarder::new(config.limits.max_body_bytes).map_err(StartupError::Forwarder)?;
    let gateway = Arc::new(Gateway::new(
        routes.clone(),
        hooks.clone(),
        forwarder,
        &config.auth.token,
        config.limits.max_body_bytes,
    ));

    tracing::info!(
        routes = routes.len(),
        hooks = config.hooks.len(),
        default_backend = %config.backend.default_url,
        "Services initialized"
    );

    Ok(Services {
        routes,
        hooks,
        gateway,
    })
}

/// Register each entry with `register_from_file` or `register_from_source`.
pub fn register_configured_hooks(
    registry: &HookRegistry,
    hooks: &[HookScriptConfig],
) -> Result<(), StartupError> {
    for (index, hook) in hooks.iter().enumerate() {
        let result = match (&hook.path, &hook.source) {
            (Some(path), _) => registry.register_from_file(hook.point, path),
            (None, Some(source)) => registry.register_from_source(hook.point, source),
            (None, None) => {
                return Err(StartupError::EmptyHook {
                    point: hook.point,
                    index,
                })
            }
        };
        result.map_err(|source| StartupError::Hook {
            point: hook.point,
            index,
            source,
        })?;
    }
    Ok(())
}

/// Handles to the servers started by [`start`].
pub struct RunningGateway {
    pub gateway_addr: SocketAddr,
    pub admin_addr: Option<SocketAddr>,
    pub services: Services,
    tasks: Vec<JoinHandle<Result<(), std::io::Error>>>,
}

impl RunningGateway {
    /// Wait for every server to stop.
    pub async fn wait(self) {
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Server exited with error"),
                Err(e) => tracing::error!(error = %e, "Server task panicked"),
            }
        }
    }
}

/// Build services, bind the gateway (and admin) listeners and spawn both
/// servers. They stop when `shutdown` is triggered.
pub async fn start(config: &GatewayConfig, shutdown: &Shutdown) -> Result<RunningGateway, StartupError> {
    let services = build_services(config)?;

    let listener = bind(&config.listener.bind_address).await?;
    let gateway_addr = local_addr(&listener, &config.listener.bind_address)?;
    let server = GatewayServer::new(services.gateway.clone(), config);
    let mut tasks = vec![tokio::spawn(server.run(listener, shutdown.subscribe()))];

    let mut admin_addr = None;
    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        admin_addr = Some(local_addr(&listener, &config.admin.bind_address)?);
        let router = setup_admin_router(AdminState {
            routes: services.routes.clone(),
            hooks: services.hooks.clone(),
            config: Arc::new(config.admin.clone()),
        });
        tasks.push(tokio::spawn(serve(listener, router, shutdown.subscribe(), "admin")));
    } else {
        tracing::info!("Admin API disabled");
    }

    Ok(RunningGateway {
        gateway_addr,
        admin_addr,
        services,
        tasks,
    })
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

fn local_addr(listener: &TcpListener, address: &str) -> Result<SocketAddr, StartupError> {
    listener.local_addr().map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}
