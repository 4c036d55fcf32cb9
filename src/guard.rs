use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Uri, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::auth::{AuthError, Identity, Role, VerifierState, token_from_cookies};

/// Where every denied request is sent.
pub const DENY_REDIRECT: &str = "/";

/// Decision
///
/// The only two outcomes of evaluating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Denial
///
/// Internal reason for a `Decision::Deny`. All variants produce the same redirect;
/// the distinction only reaches the server log.
#[derive(Debug, Error)]
pub enum Denial {
    #[error("no token on protected path")]
    Unauthenticated,

    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] AuthError),

    #[error("role {role} not permitted under {prefix}")]
    Unauthorized { role: Role, prefix: &'static str },
}

/// RuleContext
///
/// What an access predicate gets to look at: the verified caller and the path
/// segment following the rule's prefix, if any.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub identity: &'a Identity,
    pub resource_id: Option<&'a str>,
}

pub type Predicate = fn(&RuleContext<'_>) -> bool;

/// AccessRule
///
/// A protected path prefix and the predicate a caller must satisfy to pass it.
#[derive(Debug, Clone, Copy)]
pub struct AccessRule {
    pub prefix: &'static str,
    pub authorize: Predicate,
}

impl AccessRule {
    /// Segment-boundary prefix match: `/admin` covers `/admin` and `/admin/...`
    /// but not `/administrators`.
    pub fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    /// First path segment after the prefix, e.g. `u1` for `/profile/edit/u1/photo`.
    pub fn resource_id<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.strip_prefix(self.prefix)?
            .strip_prefix('/')?
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }
}

fn any_member(ctx: &RuleContext<'_>) -> bool {
    matches!(
        ctx.identity.role,
        Role::TeamMember | Role::TeamLeader | Role::Admin
    )
}

// Project ownership is enforced by the REST backend, not here: the gate has no
// ownership data without a network call. Any member role passes.
fn project_editor(ctx: &RuleContext<'_>) -> bool {
    any_member(ctx)
}

fn profile_editor(ctx: &RuleContext<'_>) -> bool {
    let editing_self = ctx.resource_id == Some(ctx.identity.user_id.as_str());
    (editing_self && any_member(ctx)) || ctx.identity.role.is_elevated()
}

fn elevated(ctx: &RuleContext<'_>) -> bool {
    ctx.identity.role.is_elevated()
}

/// The protected path table, evaluated in order, first match wins.
pub const ACCESS_RULES: &[AccessRule] = &[
    AccessRule {
        prefix: "/projects/create",
        authorize: any_member,
    },
    AccessRule {
        prefix: "/projects/edit",
        authorize: project_editor,
    },
    AccessRule {
        prefix: "/profile/edit",
        authorize: profile_editor,
    },
    AccessRule {
        prefix: "/admin",
        authorize: elevated,
    },
];

/// match_rule
///
/// Finds the rule protecting `path`, if any.
pub fn match_rule(path: &str) -> Option<&'static AccessRule> {
    ACCESS_RULES.iter().find(|rule| rule.matches(path))
}

/// RouteGuard
///
/// Decides whether a request may reach the page renderer. Holds only read-only
/// configuration, so a clone is shared by every request.
#[derive(Clone)]
pub struct RouteGuard {
    verifier: VerifierState,
    secret: Arc<str>,
}

impl RouteGuard {
    pub fn new(verifier: VerifierState, secret: &str) -> Self {
        Self {
            verifier,
            secret: Arc::from(secret),
        }
    }

    /// evaluate
    ///
    /// Pure decision over `(path, token)`. Unprotected paths are always allowed,
    /// whatever the token looks like.
    pub fn evaluate(&self, path: &str, token: Option<&str>) -> Decision {
        let Some(rule) = match_rule(path) else {
            return Decision::Allow;
        };

        match self.authorize(rule, path, token) {
            Ok(identity) => {
                tracing::debug!(
                    path,
                    prefix = rule.prefix,
                    user_id = %identity.user_id,
                    role = %identity.role,
                    "access granted"
                );
                Decision::Allow
            }
            Err(denial) => {
                match &denial {
                    Denial::InvalidCredential(err) => {
                        tracing::warn!(path, prefix = rule.prefix, error = %err, "rejected credential");
                    }
                    other => {
                        tracing::info!(path, prefix = rule.prefix, reason = %other, "access denied");
                    }
                }
                Decision::Deny
            }
        }
    }

    fn authorize(
        &self,
        rule: &AccessRule,
        path: &str,
        token: Option<&str>,
    ) -> Result<Identity, Denial> {
        let token = token.ok_or(Denial::Unauthenticated)?;
        let claims = self.verifier.verify(token, &self.secret)?;
        let identity = Identity::try_from(claims)?;

        let ctx = RuleContext {
            identity: &identity,
            resource_id: rule.resource_id(path),
        };
        if !(rule.authorize)(&ctx) {
            return Err(Denial::Unauthorized {
                role: identity.role,
                prefix: rule.prefix,
            });
        }

        Ok(identity)
    }
}

impl std::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGuard").finish_non_exhaustive()
    }
}

/// canonical_path
///
/// The one form of a request path that both the guard and the page renderer get to see.
/// Escapes of unreserved characters and of `/` are decoded; other escapes are only
/// upper-cased. `\` counts as `/`. Empty and `.` segments are dropped and `..` pops
/// the previous one. A trailing `/` survives.
pub fn canonical_path(raw: &str) -> String {
    let decoded = decode_path(raw);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut canonical = String::with_capacity(decoded.len());
    for segment in &segments {
        canonical.push('/');
        canonical.push_str(segment);
    }

    let trailing_slash =
        decoded.ends_with('/') || decoded.ends_with("/.") || decoded.ends_with("/..");
    if canonical.is_empty() || trailing_slash {
        canonical.push('/');
    }
    canonical
}

fn decode_path(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();

    while let Some((at, c)) = chars.next() {
        match c {
            '%' => match raw.get(at + 1..at + 3).and_then(hex_byte) {
                Some(byte) => {
                    chars.nth(1);
                    if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/')
                    {
                        decoded.push(char::from(byte));
                    } else {
                        decoded.push_str(&format!("%{byte:02X}"));
                    }
                }
                None => decoded.push('%'),
            },
            '\\' => decoded.push('/'),
            other => decoded.push(other),
        }
    }

    decoded
}

fn hex_byte(hex: &str) -> Option<u8> {
    if hex.len() == 2 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

fn with_path(uri: &Uri, path: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>()?);
    Ok(Uri::from_parts(parts)?)
}

/// route_guard
///
/// Middleware wrapping the whole router. Rewrites the request to its canonical path,
/// reads the `token` cookie, evaluates the guard on that same path and either passes
/// the request on or redirects to `/`.
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = canonical_path(request.uri().path());

    if path != request.uri().path() {
        match with_path(request.uri(), &path) {
            Ok(uri) => {
                tracing::debug!(raw = %request.uri(), canonical = %path, "normalized request path");
                *request.uri_mut() = uri;
            }
            Err(err) => {
                tracing::warn!(raw = %request.uri(), error = %err, "unusable request path");
                return Redirect::temporary(DENY_REDIRECT).into_response();
            }
        }
    }

    let token = token_from_cookies(request.headers());

    match guard.evaluate(&path, token.as_deref()) {
        Decision::Allow => next.run(request).await,
        Decision::Deny => Redirect::temporary(DENY_REDIRECT).into_response(),
    }
}
