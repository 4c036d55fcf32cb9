use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::{BackendErrorBody, LoginRequest, LoginResponse},
};

/// AuthBackend
///
/// The REST backend's login endpoint. The gate only exchanges credentials for a token;
/// it never issues or refreshes tokens itself.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Returns the issued token, or `AppError::LoginRejected` carrying the backend's status and message.
    async fn login(&self, credentials: &LoginRequest) -> Result<String, AppError>;
}

/// HttpAuthBackend
///
/// Calls `POST {backend_url}/api/auth/login` with `reqwest`.
#[derive(Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    backend_url: String,
}

impl HttpAuthBackend {
    pub fn new(backend_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            backend_url: backend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn login_url(&self) -> String {
        format!("{}/api/auth/login", self.backend_url)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &LoginRequest) -> Result<String, AppError> {
        let response = self
            .client
            .post(self.login_url())
            .json(credentials)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // A body that isn't the usual `{message}` still yields the default text.
            let body = response.json::<BackendErrorBody>().await.unwrap_or_default();
            return Err(AppError::LoginRejected {
                status,
                message: body.message.unwrap_or_else(|| "Login failed".to_string()),
            });
        }

        let issued = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("unexpected login response: {e}")))?;

        Ok(issued.token)
    }
}

/// MockAuthBackend
///
/// Test double: hands out `token` when set, otherwise rejects with `401`.
#[derive(Clone, Default)]
pub struct MockAuthBackend {
    pub token: Option<String>,
    pub should_fail: bool,
}

impl MockAuthBackend {
    pub fn issuing(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            should_fail: false,
        }
    }

    pub fn rejecting() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            token: None,
            should_fail: true,
        }
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, _credentials: &LoginRequest) -> Result<String, AppError> {
        if self.should_fail {
            return Err(AppError::Upstream(
                "Mock Backend Error: Simulation requested".to_string(),
            ));
        }

        self.token.clone().ok_or_else(|| AppError::LoginRejected {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid credentials".to_string(),
        })
    }
}

/// AuthBackendState
///
/// The shared login backend held in application state.
pub type AuthBackendState = Arc<dyn AuthBackend>;
