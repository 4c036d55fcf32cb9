use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use std::sync::Arc;

use crate::error::AppError;

/// Largest request body forwarded to the page renderer (10 MiB).
pub const MAX_FORWARD_BODY: usize = 10 * 1024 * 1024;

// 1. UpstreamService Contract
/// UpstreamService
///
/// Where requests go once the guard has allowed them. The real implementation
/// proxies to the page-rendering service; the mock answers in-process for tests.
#[async_trait]
pub trait UpstreamService: Send + Sync {
    async fn forward(&self, request: Request) -> Result<Response, AppError>;
}

// 2. The Real Implementation (HTTP proxy)
/// HttpUpstream
///
/// Forwards method, path, query, headers and body with `reqwest`, and relays the
/// response as-is. Redirects from the renderer are passed back to the browser, not followed.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }
}

#[async_trait]
impl UpstreamService for HttpUpstream {
    async fn forward(&self, request: Request) -> Result<Response, AppError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.target_url(path_and_query);

        let body = to_bytes(body, MAX_FORWARD_BODY)
            .await
            .map_err(|_| AppError::PayloadTooLarge)?;

        let mut headers = parts.headers;
        if let Some(host) = headers.get(header::HOST).cloned() {
            headers.insert(HeaderName::from_static("x-forwarded-host"), host);
        }
        strip_hop_by_hop(&mut headers);

        tracing::debug!(method = %parts.method, url = %url, "forwarding to upstream");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);
        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

/// strip_hop_by_hop
///
/// Removes headers that describe a single connection and must not be relayed, including
/// any listed in `Connection`, plus `Host` and `Content-Length` which the outgoing client
/// recomputes.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    const HOP_BY_HOP: [&str; 8] = [
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailer",
        "transfer-encoding",
        "upgrade",
    ];

    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
}

// 3. The Mock Implementation (For Tests)
/// MockUpstream
///
/// Answers every request itself with `200` and a body naming the method and path it
/// received, so tests can tell a pass-through from a redirect.
#[derive(Clone, Default)]
pub struct MockUpstream {
    /// When true, every forward fails as if the renderer were down.
    pub should_fail: bool,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl UpstreamService for MockUpstream {
    async fn forward(&self, request: Request) -> Result<Response, AppError> {
        if self.should_fail {
            return Err(AppError::Upstream(
                "Mock Upstream Error: Simulation requested".to_string(),
            ));
        }

        let body = format!("upstream {} {}", request.method(), request.uri().path());
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Ok(response)
    }
}

/// UpstreamState
///
/// The shared upstream held in application state.
pub type UpstreamState = Arc<dyn UpstreamService>;
