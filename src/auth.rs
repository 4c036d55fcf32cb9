use std::{fmt, str::FromStr, sync::Arc};

use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the cookie the web client stores the access token in.
pub const TOKEN_COOKIE: &str = "token";

/// Lifetime of the session cookie, matching the issuer's 7 day token expiry.
pub const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Claims
///
/// Payload of the access token issued by the REST backend on login.
/// Every field is optional at the type level: a token that verifies but lacks
/// `userId` or `role` is rejected later by `Identity::try_from`, not by serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Backend identifier of the member. Carried as `userId` on the wire.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// One of `team_member`, `team_leader`, `admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration time (seconds since epoch). Checked by the verifier when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Issued at (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

/// Role
///
/// The closed set of roles the backend hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TeamMember,
    TeamLeader,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TeamMember => "team_member",
            Role::TeamLeader => "team_leader",
            Role::Admin => "admin",
        }
    }

    /// Team leaders and admins may act on other members' resources.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::TeamLeader | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team_member" => Ok(Role::TeamMember),
            "team_leader" => Ok(Role::TeamLeader),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity
///
/// The caller resolved from a verified token. Only exists when both claims are present
/// and the role is one the gate knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl TryFrom<Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        // Empty strings count as missing, same as an absent field.
        let user_id = claims
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingClaim("userId"))?;
        let role = claims
            .role
            .filter(|role| !role.is_empty())
            .ok_or(AuthError::MissingClaim("role"))?
            .parse()?;

        Ok(Identity { user_id, role })
    }
}

/// AuthError
///
/// Why a token was not accepted. Never shown to the client; the guard logs it and redirects.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),

    #[error("token payload missing {0}")]
    MissingClaim(&'static str),

    #[error("unrecognized role {0:?}")]
    UnknownRole(String),
}

/// TokenVerifier
///
/// Checks a token's signature against the shared secret and returns its decoded claims.
/// Kept behind a trait so the guard can be exercised with fake claims.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, secret: &str) -> Result<Claims, AuthError>;
}

/// VerifierState
///
/// The shared verifier held in application state.
pub type VerifierState = Arc<dyn TokenVerifier>;

/// JwtVerifier
///
/// HMAC (HS256/384/512) verification with `jsonwebtoken`. `exp` and `nbf` are enforced
/// with zero leeway when present but not required, which is how the issuer's tokens
/// have always been accepted by the web client.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    validation: Validation,
}

impl JwtVerifier {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self { validation }
    }
}

impl Default for JwtVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str, secret: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        let data = decode::<Claims>(token, &key, &self.validation)?;
        Ok(data.claims)
    }
}

/// token_from_cookies
///
/// Pulls the `token` cookie out of every `Cookie` header on the request.
/// An empty value is treated the same as no cookie.
pub fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// session_cookie
///
/// `Set-Cookie` value storing a freshly issued token for the session lifetime.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; Path=/; Max-Age={SESSION_MAX_AGE_SECS}; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// cleared_session_cookie
///
/// `Set-Cookie` value that makes the browser drop the token.
pub fn cleared_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{TOKEN_COOKIE}=; Path=/; Max-Age=0; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
