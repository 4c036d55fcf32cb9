use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Session Router Module
///
/// Owns the `token` cookie lifecycle. Nested under `/session`.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // POST /session/login
        // Forwards credentials to the backend and sets the `token` cookie on success.
        .route("/login", post(handlers::login))
        // POST /session/logout
        // Expires the `token` cookie.
        .route("/logout", post(handlers::logout))
}
