use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::admin::AdminState;
use crate::hooks::{HookError, HookPoint};
use crate::routing::{RouteDefinition, RouteError};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub route: RouteDefinition,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRouteRequest {
    pub path: String,
    #[serde(default)]
    pub method: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHookRequest {
    pub hook_point: String,
    pub script: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearHookRequest {
    pub hook_point: String,
}

/// Failure of one admin call, rendered as `{"success": false, "error": ...}`.
#[derive(Debug)]
pub enum AdminError {
    BadRequest(String),
    Route(RouteError),
    Hook(HookError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AdminError::Route(e @ RouteError::Conflict { .. }) => (StatusCode::CONFLICT, e.to_string()),
            AdminError::Route(e @ RouteError::NotFound { .. }) => (StatusCode::NOT_FOUND, e.to_string()),
            AdminError::Hook(e @ (HookError::UnknownPoint(_) | HookError::Compile(_))) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AdminError::Hook(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, error_body(&message)).into_response()
    }
}

impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        AdminError::BadRequest(format!("invalid request: {}", rejection.body_text()))
    }
}

impl From<RouteError> for AdminError {
    fn from(e: RouteError) -> Self {
        AdminError::Route(e)
    }
}

impl From<HookError> for AdminError {
    fn from(e: HookError) -> Self {
        AdminError::Hook(e)
    }
}

pub fn error_body(message: &str) -> Json<Value> {
    Json(json!({"success": false, "error": message}))
}

fn data(value: impl Serialize) -> Json<Value> {
    Json(json!({"success": true, "data": value}))
}

fn message(text: &str) -> Json<Value> {
    Json(json!({"success": true, "message": text}))
}

pub async fn get_status() -> Json<Value> {
    data(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn list_routes(State(state): State<AdminState>) -> Json<Value> {
    data(state.routes.list())
}

pub async fn add_route(
    State(state): State<AdminState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<Value>, AdminError> {
    let Json(request) = payload?;
    state.routes.add(request.route)?;
    Ok(message("route added successfully"))
}

pub async fn update_route(
    State(state): State<AdminState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<Value>, AdminError> {
    let Json(request) = payload?;
    state.routes.update(request.route)?;
    Ok(message("route updated successfully"))
}

pub async fn delete_route(
    State(state): State<AdminState>,
    payload: Result<Json<DeleteRouteRequest>, JsonRejection>,
) -> Result<Json<Value>, AdminError> {
    let Json(request) = payload?;
    state.routes.delete(&request.path, &request.method)?;
    Ok(message("route deleted successfully"))
}

pub async fn list_hooks(State(state): State<AdminState>) -> Json<Value> {
    let counts: Map<String, Value> = state
        .hooks
        .snapshot()
        .into_iter()
        .map(|(point, count)| (point.to_string(), json!(count)))
        .collect();
    data(counts)
}

pub async fn update_hook(
    State(state): State<AdminState>,
    payload: Result<Json<UpdateHookRequest>, JsonRejection>,
) -> Result<Json<Value>, AdminError> {
    let Json(request) = payload?;
    let point: HookPoint = request.hook_point.parse()?;
    state.hooks.replace_all(point, &request.script)?;
    Ok(message("hook updated successfully"))
}

pub async fn clear_hook(
    State(state): State<AdminState>,
    payload: Result<Json<ClearHookRequest>, JsonRejection>,
) -> Result<Json<Value>, AdminError> {
    let Json(request) = payload?;
    let point: HookPoint = request.hook_point.parse()?;
    state.hooks.clear(point);
    Ok(message("hook cleared successfully"))
}
