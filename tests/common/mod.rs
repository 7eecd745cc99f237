//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use script_gateway::config::GatewayConfig;
use script_gateway::lifecycle::{start, RunningGateway, Shutdown};

pub const AUTH_TOKEN: &str = "test-token";
pub const ADMIN_TOKEN: &str = "test-admin-token";

async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start a backend that answers every request with a JSON description of it:
/// `{method, path, query, headers, body}`.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        }))
    }

    spawn_router(Router::new().fallback(echo)).await
}

/// Start a backend that returns a fixed status and JSON body.
pub async fn start_fixed_backend(status: u16, body: &'static str) -> SocketAddr {
    let status = StatusCode::from_u16(status).unwrap();
    let router = Router::new().fallback(move || async move {
        (status, [("content-type", "application/json")], body)
    });
    spawn_router(router).await
}

/// An address nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config bound to ephemeral ports with `backend` as the default.
pub fn test_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.admin.bind_address = "127.0.0.1:0".into();
    config.admin.token = ADMIN_TOKEN.into();
    config.auth.token = AUTH_TOKEN.into();
    config.backend.default_url = format!("http://{backend}");
    config
}

pub struct TestGateway {
    pub running: RunningGateway,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.running.gateway_addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        let addr = self.running.admin_addr.expect("admin listener enabled");
        format!("http://{addr}{path}")
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.running.wait().await;
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let shutdown = Shutdown::new();
    let running = start(&config, &shutdown).await.unwrap();
    TestGateway { running, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn bearer() -> String {
    format!("Bearer {AUTH_TOKEN}")
}
