use std::env;

/// AppConfig
///
/// Holds the gate's configuration. Loaded once at startup and never mutated,
/// so it can be cloned freely into request handlers through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // Shared HMAC secret used to verify the `token` cookie.
    pub jwt_secret: String,
    // Base URL of the REST backend (`/api/auth/login`, `/api/users`, ...).
    pub backend_url: String,
    // Base URL of the page-rendering service that allowed requests are forwarded to.
    pub upstream_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Env
///
/// Runtime context. `Local` enables human-readable logs and development fallbacks,
/// `Production` requires every secret to be provided explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "portfolio-local-development-secret";
const LOCAL_BACKEND_URL: &str = "http://localhost:5000";
const LOCAL_UPSTREAM_URL: &str = "http://localhost:3001";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

impl Default for AppConfig {
    /// Non-panicking configuration for tests; never touches the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            backend_url: LOCAL_BACKEND_URL.to_string(),
            upstream_url: LOCAL_UPSTREAM_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `JWT_SECRET`, `BACKEND_URL` or
    /// `UPSTREAM_URL` is missing. The gate must not start without a verification secret.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                backend_url: trim_base_url(
                    env::var("BACKEND_URL").unwrap_or_else(|_| LOCAL_BACKEND_URL.to_string()),
                ),
                upstream_url: trim_base_url(
                    env::var("UPSTREAM_URL").unwrap_or_else(|_| LOCAL_UPSTREAM_URL.to_string()),
                ),
                bind_addr,
                cookie_secure: flag("COOKIE_SECURE", false),
            },
            Env::Production => Self {
                env: Env::Production,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                backend_url: trim_base_url(
                    env::var("BACKEND_URL").expect("FATAL: BACKEND_URL required in prod"),
                ),
                upstream_url: trim_base_url(
                    env::var("UPSTREAM_URL").expect("FATAL: UPSTREAM_URL required in prod"),
                ),
                bind_addr,
                cookie_secure: flag("COOKIE_SECURE", true),
            },
        }
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn flag(key: &str, default: bool) -> bool {
    match env::var(key).as_deref() {
        Ok("true") | Ok("1") => true,
        Ok("false") | Ok("0") => false,
        _ => default,
    }
}
