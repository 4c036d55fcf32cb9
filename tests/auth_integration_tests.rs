use axum::http::{HeaderMap, HeaderValue, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use portfolio_gate::auth::{
    AuthError, Claims, Identity, JwtVerifier, Role, SESSION_MAX_AGE_SECS, TokenVerifier,
    cleared_session_cookie, session_cookie, token_from_cookies,
};
use serde_json::json;
use std::time::SystemTime;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn sign(payload: serde_json::Value, alg: Algorithm, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(alg), &payload, &key).unwrap()
}

/// A token shaped like the backend's: userId, role, 7 day expiry.
fn backend_token(user_id: &str, role: &str) -> String {
    let iat = now();
    sign(
        json!({ "userId": user_id, "role": role, "iat": iat, "exp": iat + SESSION_MAX_AGE_SECS }),
        Algorithm::HS256,
        TEST_JWT_SECRET,
    )
}

// --- JwtVerifier ---

#[test]
fn test_verify_accepts_backend_token() {
    let token = backend_token("64f1c0ffee", "team_leader");

    let claims = JwtVerifier::new().verify(&token, TEST_JWT_SECRET).unwrap();

    assert_eq!(claims.user_id.as_deref(), Some("64f1c0ffee"));
    assert_eq!(claims.role.as_deref(), Some("team_leader"));
    assert!(claims.exp.is_some());
}

#[test]
fn test_verify_accepts_other_hmac_algorithms() {
    for alg in [Algorithm::HS384, Algorithm::HS512] {
        let token = sign(
            json!({ "userId": "u1", "role": "admin", "exp": now() + 60 }),
            alg,
            TEST_JWT_SECRET,
        );
        assert!(JwtVerifier::new().verify(&token, TEST_JWT_SECRET).is_ok(), "{alg:?}");
    }
}

#[test]
fn test_verify_accepts_token_without_exp() {
    let token = sign(
        json!({ "userId": "u1", "role": "team_member" }),
        Algorithm::HS256,
        TEST_JWT_SECRET,
    );

    let claims = JwtVerifier::new().verify(&token, TEST_JWT_SECRET).unwrap();
    assert!(claims.exp.is_none());
}

#[test]
fn test_verify_rejects_wrong_secret() {
    let token = backend_token("u1", "admin");

    let result = JwtVerifier::new().verify(&token, "some-other-secret");

    assert!(matches!(result, Err(AuthError::Verification(_))));
}

#[test]
fn test_verify_rejects_expired_token() {
    let issued = now() - 3600;
    let token = sign(
        json!({ "userId": "u1", "role": "admin", "iat": issued, "exp": issued + 60 }),
        Algorithm::HS256,
        TEST_JWT_SECRET,
    );

    let result = JwtVerifier::new().verify(&token, TEST_JWT_SECRET);

    assert!(matches!(result, Err(AuthError::Verification(_))));
}

#[test]
fn test_verify_rejects_not_yet_valid_token() {
    let token = sign(
        json!({ "userId": "u1", "role": "admin", "nbf": now() + 3600 }),
        Algorithm::HS256,
        TEST_JWT_SECRET,
    );

    assert!(JwtVerifier::new().verify(&token, TEST_JWT_SECRET).is_err());
}

#[test]
fn test_verify_rejects_garbage() {
    let verifier = JwtVerifier::new();
    for token in ["", "not-a-jwt", "a.b.c", "eyJhbGciOiJIUzI1NiJ9..", "🙃.🙃.🙃"] {
        assert!(verifier.verify(token, TEST_JWT_SECRET).is_err(), "{token}");
    }
}

#[test]
fn test_verify_rejects_wrongly_typed_role() {
    let token = sign(
        json!({ "userId": "u1", "role": 3 }),
        Algorithm::HS256,
        TEST_JWT_SECRET,
    );

    assert!(JwtVerifier::new().verify(&token, TEST_JWT_SECRET).is_err());
}

#[test]
fn test_verified_token_without_role_fails_identity() {
    let token = sign(
        json!({ "userId": "u1", "exp": now() + 60 }),
        Algorithm::HS256,
        TEST_JWT_SECRET,
    );

    let claims = JwtVerifier::new().verify(&token, TEST_JWT_SECRET).unwrap();
    let identity = Identity::try_from(claims);

    assert!(matches!(identity, Err(AuthError::MissingClaim("role"))));
}

// --- Identity ---

#[test]
fn test_identity_from_complete_claims() {
    let claims = Claims {
        user_id: Some("u1".to_string()),
        role: Some("admin".to_string()),
        ..Claims::default()
    };

    let identity = Identity::try_from(claims).unwrap();

    assert_eq!(
        identity,
        Identity {
            user_id: "u1".to_string(),
            role: Role::Admin,
        }
    );
}

#[test]
fn test_identity_requires_user_id() {
    let claims = Claims {
        user_id: Some(String::new()),
        role: Some("admin".to_string()),
        ..Claims::default()
    };

    assert!(matches!(
        Identity::try_from(claims),
        Err(AuthError::MissingClaim("userId"))
    ));
}

#[test]
fn test_identity_rejects_unknown_role() {
    let claims = Claims {
        user_id: Some("u1".to_string()),
        role: Some("superuser".to_string()),
        ..Claims::default()
    };

    match Identity::try_from(claims) {
        Err(AuthError::UnknownRole(role)) => assert_eq!(role, "superuser"),
        other => panic!("expected UnknownRole, got {other:?}"),
    }
}

#[test]
fn test_role_elevation() {
    assert!(!Role::TeamMember.is_elevated());
    assert!(Role::TeamLeader.is_elevated());
    assert!(Role::Admin.is_elevated());
    assert_eq!("team_leader".parse::<Role>().unwrap(), Role::TeamLeader);
    assert_eq!(Role::TeamMember.to_string(), "team_member");
}

// --- Cookies ---

fn cookie_headers(values: &[&str]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for value in values {
        headers.append(header::COOKIE, HeaderValue::from_str(value).unwrap());
    }
    headers
}

#[test]
fn test_token_cookie_found_among_others() {
    let headers = cookie_headers(&["theme=dark; token=abc.def.ghi; lang=en"]);
    assert_eq!(token_from_cookies(&headers).as_deref(), Some("abc.def.ghi"));
}

#[test]
fn test_token_cookie_found_in_second_header() {
    let headers = cookie_headers(&["theme=dark", "token=abc"]);
    assert_eq!(token_from_cookies(&headers).as_deref(), Some("abc"));
}

#[test]
fn test_token_cookie_absent_or_empty() {
    assert_eq!(token_from_cookies(&HeaderMap::new()), None);
    assert_eq!(token_from_cookies(&cookie_headers(&["theme=dark"])), None);
    assert_eq!(token_from_cookies(&cookie_headers(&["token="])), None);
    // A cookie merely ending in "token" is a different cookie.
    assert_eq!(token_from_cookies(&cookie_headers(&["csrftoken=zzz"])), None);
}

#[test]
fn test_session_cookie_attributes() {
    let cookie = session_cookie("abc", false);
    assert_eq!(cookie, "token=abc; Path=/; Max-Age=604800; SameSite=Lax");

    assert!(session_cookie("abc", true).ends_with("; Secure"));
    assert!(cleared_session_cookie(false).starts_with("token=; Path=/; Max-Age=0"));
}
