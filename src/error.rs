use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

/// AppError
///
/// Failures of the gate's own handlers. Guard denials are not errors; they are redirects.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("{message}")]
    LoginRejected { status: StatusCode, message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
            AppError::Upstream(detail) => {
                // Detail stays in the log; the client gets a generic gateway error.
                tracing::error!(error = %detail, "upstream call failed");
                (StatusCode::BAD_GATEWAY, "Bad gateway".to_string())
            }
            AppError::LoginRejected { status, message } => (status, message),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
