//! Outbound call to the backend.
//!
//! One request, one fully drained response. No retries and no pool policy
//! beyond what the hyper client does by default. Backends may be `http` or
//! `https`; TLS goes through the platform library via `hyper-tls`.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid backend URI {0:?}")]
    InvalidUri(String),

    #[error("invalid backend method {0:?}")]
    InvalidMethod(String),

    #[error("failed to build backend request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("backend unreachable: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read backend response: {0}")]
    Body(#[source] axum::Error),

    #[error("failed to initialize TLS: {0}")]
    Tls(#[from] native_tls::Error),
}

/// A resolved outbound request.
#[derive(Debug)]
pub struct OutboundRequest<'a> {
    pub method: &'a str,
    /// Absolute base URL, e.g. `http://users:8080`.
    pub base_url: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl OutboundRequest<'_> {
    /// `base_url` (trailing `/` trimmed) + `path` + `?query`.
    pub fn url(&self) -> String {
        let mut url = format!("{}{}", self.base_url.trim_end_matches('/'), self.path);
        if let Some(query) = self.query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// The backend's answer with its body fully read.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(max_body_bytes: usize) -> Result<Self, ForwardError> {
        let tls = native_tls::TlsConnector::new()?;
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let connector = HttpsConnector::from((http, tls.into()));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Ok(Self {
            client,
            max_body_bytes,
        })
    }

    /// Execute `outbound` and drain the response body.
    ///
    /// Dropping the returned future aborts the backend call.
    pub async fn forward(&self, outbound: OutboundRequest<'_>) -> Result<ForwardedResponse, ForwardError> {
        let url = outbound.url();
        let uri: Uri = url.parse().map_err(|_| ForwardError::InvalidUri(url.clone()))?;
        let method = Method::from_bytes(outbound.method.as_bytes())
            .map_err(|_| ForwardError::InvalidMethod(outbound.method.to_string()))?;

        let mut request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Body::from(outbound.body))?;
        *request.headers_mut() = outbound.headers;

        tracing::debug!(method = %method, url = %url, "Forwarding to backend");

        let response = self.client.request(request).await?;
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
            .await
            .map_err(ForwardError::Body)?;

        tracing::debug!(url = %url, status = %parts.status, bytes = body.len(), "Backend responded");

        Ok(ForwardedResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}
