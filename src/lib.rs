use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod upstream;

// Gate-owned routes (health, session). Everything else is forwarded upstream.
pub mod routes;
use routes::{public, session};

// --- Public Re-exports ---

pub use auth::{JwtVerifier, TokenVerifier, VerifierState};
pub use backend::{AuthBackendState, HttpAuthBackend, MockAuthBackend};
pub use config::AppConfig;
pub use guard::{Decision, RouteGuard};
pub use upstream::{HttpUpstream, MockUpstream, UpstreamState};

/// ApiDoc
///
/// OpenAPI document for the endpoints the gate answers itself, served at
/// `/api-docs/openapi.json`. Proxied pages are not part of it.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::login, handlers::logout),
    components(schemas(models::LoginRequest, models::SessionResponse, models::ErrorBody)),
    tags(
        (name = "portfolio-gate", description = "Team portfolio edge gate")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for everything a request may need. Cloned per request;
/// every field is either configuration or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Route guard: verifier plus the shared secret.
    pub guard: RouteGuard,
    /// Page renderer that allowed requests are forwarded to.
    pub upstream: UpstreamState,
    /// Backend login endpoint used by the session routes.
    pub auth_backend: AuthBackendState,
    /// The loaded environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the production state: JWT verification, HTTP upstream and HTTP login backend.
    pub fn from_config(config: AppConfig) -> Result<Self, reqwest::Error> {
        let guard = RouteGuard::new(Arc::new(JwtVerifier::new()), &config.jwt_secret);
        let upstream = Arc::new(HttpUpstream::new(&config.upstream_url)?) as UpstreamState;
        let auth_backend = Arc::new(HttpAuthBackend::new(&config.backend_url)) as AuthBackendState;

        Ok(Self {
            guard,
            upstream,
            auth_backend,
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RouteGuard {
    fn from_ref(app_state: &AppState) -> RouteGuard {
        app_state.guard.clone()
    }
}

impl FromRef<AppState> for UpstreamState {
    fn from_ref(app_state: &AppState) -> UpstreamState {
        app_state.upstream.clone()
    }
}

impl FromRef<AppState> for AuthBackendState {
    fn from_ref(app_state: &AppState) -> AuthBackendState {
        app_state.auth_backend.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gate: its own routes, the upstream fallback, the route guard around
/// all of them, then the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/session", session::session_routes())
        // Pages, assets and anything else the renderer serves.
        .fallback(handlers::forward_to_upstream)
        // Guard runs before routing reaches either the gate's handlers or the fallback.
        .layer(middleware::from_fn_with_state(
            state.guard.clone(),
            guard::route_guard,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, carrying method, uri and the `x-request-id` so guard
/// decisions can be correlated with the request that triggered them.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
