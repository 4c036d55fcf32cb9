use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Request Payloads ---

/// LoginRequest
///
/// Credentials submitted by the login form (POST /session/login). Passed straight
/// through to the backend's `/api/auth/login`; never logged or stored by the gate.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "member@team.dev")]
    pub email: String,
    pub password: String,
}

// --- Response Payloads ---

/// SessionResponse
///
/// Body returned by the session endpoints. The token itself only travels in `Set-Cookie`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionResponse {
    pub ok: bool,
}

/// ErrorBody
///
/// JSON error shape, same `message` field the backend uses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub message: String,
}

// --- Backend Contracts ---

/// LoginResponse
///
/// Successful reply of the backend's `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// BackendErrorBody
///
/// Error reply of the backend; `message` is optional since not every failure carries one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
