//! Administrative API.
//!
//! Served on its own listener. Every request must carry the configured
//! shared-secret header; the check runs before routing.
//!
//! | Method | Path                   | Body                      |
//! |--------|------------------------|---------------------------|
//! | GET    | `/admin/status`        |                           |
//! | GET    | `/admin/routes`        |                           |
//! | POST   | `/admin/routes/add`    | `{route}`                 |
//! | POST   | `/admin/routes/update` | `{route}`                 |
//! | POST   | `/admin/routes/delete` | `{path, method}`          |
//! | GET    | `/admin/hooks`         |                           |
//! | POST   | `/admin/hooks/update`  | `{hookPoint, script}`     |
//! | POST   | `/admin/hooks/clear`   | `{hookPoint}`             |

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::AdminConfig;
use crate::hooks::HookRegistry;
use crate::routing::RouteStore;
use self::auth::admin_auth_middleware;
use self::handlers::*;

#[derive(Clone)]
pub struct AdminState {
    pub routes: Arc<RouteStore>,
    pub hooks: Arc<HookRegistry>,
    pub config: Arc<AdminConfig>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(list_routes))
        .route("/admin/routes/add", post(add_route))
        .route("/admin/routes/update", post(update_route))
        .route("/admin/routes/delete", post(delete_route))
        .route("/admin/hooks", get(list_hooks))
        .route("/admin/hooks/update", post(update_hook))
        .route("/admin/hooks/clear", post(clear_hook))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
