//! Pipeline orchestrator.
//!
//! # Stages
//! ```text
//! Match → Auth → RequestTransformHooks → RequestDSL → BeforeForward
//!       → Forward → AfterForward → ResponseTransformHooks → ResponseDSL
//!       → WriteResponse
//! ```
//!
//! A route miss is not a failure: the request is forwarded to the default
//! backend with no template rewriting. Any stage failure is terminal: the
//! error is recorded on the context, OnError hooks run, and the stage's
//! status is returned.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::hooks::{HookPoint, HookRegistry, RequestContext};
use crate::http::error::GatewayError;
use crate::http::forwarder::{ForwardedResponse, Forwarder, OutboundRequest};
use crate::http::middleware::{AuthStage, ErrorStage, TransformStage};
use crate::http::request::{normalize_headers, request_facts, request_id};
use crate::routing::{RouteDefinition, RouteStore};
use crate::transform::transform_with_context;

/// Backend response headers that describe the original framing and must
/// not be replayed on the rewritten response.
const FRAMING_HEADERS: [HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// Composes routing, hooks, templates and forwarding for one request.
pub struct Gateway {
    routes: Arc<RouteStore>,
    hooks: Arc<HookRegistry>,
    forwarder: Forwarder,
    auth: AuthStage,
    transform: TransformStage,
    errors: ErrorStage,
    max_body_bytes: usize,
}

impl Gateway {
    pub fn new(
        routes: Arc<RouteStore>,
        hooks: Arc<HookRegistry>,
        forwarder: Forwarder,
        auth_token: &str,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            auth: AuthStage::new(hooks.clone(), auth_token),
            transform: TransformStage::new(hooks.clone()),
            errors: ErrorStage::new(hooks.clone()),
            routes,
            hooks,
            forwarder,
            max_body_bytes,
        }
    }

    /// Run the full pipeline for one inbound request.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();
        let request_id = request_id(&parts.headers);
        let mut ctx = RequestContext::new();
        ctx.request_headers = normalize_headers(&parts.headers);

        let body = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(&mut ctx, &request_id, GatewayError::RequestBody(e.to_string())),
        };
        ctx.request_body = body.to_vec();

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            path = %parts.uri.path(),
            "Gateway request"
        );

        match self.process(&parts, &mut ctx, &request_id).await {
            Ok(response) => response,
            Err(e) => self.fail(&mut ctx, &request_id, e),
        }
    }

    async fn process(
        &self,
        parts: &Parts,
        ctx: &mut RequestContext,
        request_id: &str,
    ) -> Result<Response, GatewayError> {
        let inbound_headers = ctx.request_headers.clone();
        ctx.data.insert(
            "request".into(),
            request_facts(parts, &inbound_headers, &ctx.request_body),
        );

        let method = parts.method.as_str();
        let path = parts.uri.path();

        // Match
        let route = match self.routes.match_route(method, path) {
            Ok(route) => {
                ctx.data.insert("route".into(), route.summary());
                Some(route)
            }
            Err(e) => {
                tracing::debug!(request_id = %request_id, error = %e, "No route matched, using default backend");
                None
            }
        };

        // Auth
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        self.auth.run(authorization, ctx)?;

        // Request transform
        self.transform.request(ctx)?;
        if let Some(template) = route.as_ref().and_then(RouteDefinition::request_template) {
            ctx.request_body = transform_with_context(&ctx.request_body, template, Some(&ctx.data))?;
        }

        self.hooks
            .execute(HookPoint::BeforeForward, ctx)
            .map_err(|e| GatewayError::hook(HookPoint::BeforeForward, e))?;

        // Forward
        let base_url = self.routes.resolve_backend_url(route.as_ref());
        let backend_path = self.routes.resolve_backend_path(route.as_ref(), path);
        let backend_method = self.routes.resolve_backend_method(route.as_ref(), method);
        let outbound = OutboundRequest {
            method: &backend_method,
            base_url: &base_url,
            path: &backend_path,
            query: parts.uri.query(),
            headers: outbound_headers(&parts.headers, &inbound_headers, &ctx.request_headers),
            body: ctx.request_body.clone(),
        };
        let forwarded = self.forwarder.forward(outbound).await.map_err(|e| {
            tracing::error!(request_id = %request_id, backend = %base_url, error = %e, "Forward failed");
            GatewayError::Forward(e)
        })?;
        let status = forwarded.status;
        record_response(ctx, forwarded);

        self.hooks
            .execute(HookPoint::AfterForward, ctx)
            .map_err(|e| GatewayError::hook(HookPoint::AfterForward, e))?;

        // Response transform
        self.transform.response(ctx)?;
        if let Some(template) = route.as_ref().and_then(RouteDefinition::response_template) {
            ctx.response_body = transform_with_context(&ctx.response_body, template, Some(&ctx.data))?;
        }

        tracing::debug!(
            request_id = %request_id,
            backend = %base_url,
            status = status.as_u16(),
            "Gateway response"
        );

        Ok(build_response(status, ctx))
    }

    fn fail(&self, ctx: &mut RequestContext, request_id: &str, error: GatewayError) -> Response {
        tracing::warn!(request_id = %request_id, error = %error, "Request failed");
        ctx.set_error(&error);
        if let Err(e) = self.errors.run(ctx) {
            tracing::error!(request_id = %request_id, error = %e, "OnError hook failed");
        }
        error.into_response()
    }
}

/// Inbound headers verbatim, overlaid with context headers that hooks added
/// or changed. Framing headers are left to the client.
fn outbound_headers(
    original: &HeaderMap,
    inbound: &HashMap<String, String>,
    current: &HashMap<String, String>,
) -> HeaderMap {
    let mut headers = original.clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);

    for (name, value) in current {
        if inbound.get(name) == Some(value) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::debug!(header = %name, "Skipping invalid header set by hook"),
        }
    }
    headers
}

/// Seed response headers and body from the backend and expose
/// `data.response = {status, header}`.
fn record_response(ctx: &mut RequestContext, forwarded: ForwardedResponse) {
    let mut headers = normalize_headers(&forwarded.headers);
    for name in &FRAMING_HEADERS {
        headers.remove(name.as_str());
    }

    ctx.data.insert(
        "response".into(),
        json!({
            "status": forwarded.status.as_u16(),
            "header": headers,
        }),
    );
    ctx.response_headers = headers;
    ctx.response_body = forwarded.body.to_vec();
}

fn build_response(status: StatusCode, ctx: &mut RequestContext) -> Response {
    let mut response = Response::new(Body::from(std::mem::take(&mut ctx.response_body)));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &ctx.response_headers {
        if FRAMING_HEADERS.iter().any(|h| h.as_str() == name) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::debug!(header = %name, "Skipping invalid response header"),
        }
    }
    response
}
