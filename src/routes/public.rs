use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints answered by the gate itself and never matched by a protected prefix.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Returns "ok" immediately to verify the gate is running and responsive.
        .route("/health", get(handlers::health))
}
