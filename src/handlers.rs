use crate::{
    AppState,
    auth::{cleared_session_cookie, session_cookie},
    error::AppError,
    models::{ErrorBody, LoginRequest, SessionResponse},
    upstream::UpstreamState,
};
use axum::{
    Json,
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response},
};

// --- Handlers ---

/// health
///
/// [Public Route] Liveness check for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Gate is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// login
///
/// [Public Route] Exchanges credentials for a token at the backend and stores it in
/// the `token` cookie for seven days. The backend's rejection status and message are relayed.
#[utoipa::path(
    post,
    path = "/session/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = SessionResponse),
        (status = 401, description = "Rejected by backend", body = ErrorBody),
        (status = 502, description = "Backend unreachable", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.auth_backend.login(&payload).await?;
    let cookie = session_cookie(&token, state.config.cookie_secure);

    tracing::info!("session established");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { ok: true }),
    ))
}

/// logout
///
/// [Public Route] Expires the `token` cookie. Always succeeds, with or without a session.
#[utoipa::path(
    post,
    path = "/session/logout",
    responses((status = 200, description = "Session cookie cleared", body = SessionResponse))
)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::SET_COOKIE,
            cleared_session_cookie(state.config.cookie_secure),
        )],
        Json(SessionResponse { ok: true }),
    )
}

/// forward_to_upstream
///
/// Router fallback. Anything the gate doesn't serve itself goes to the page renderer,
/// after the route guard has let it through.
pub async fn forward_to_upstream(
    State(upstream): State<UpstreamState>,
    request: Request,
) -> Result<Response, AppError> {
    upstream.forward(request).await
}
