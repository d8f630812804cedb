//! Router-level tests driven through `tower::ServiceExt::oneshot`

use acadash_api::{app, AppState};
use acadash_auth::config::JwtConfig;
use acadash_auth::middleware::BearerAuth;
use acadash_auth::{
    AuthConfig, AuthError, AuthResult, IdentityBackend, JwtIssuer, LocalBackend, MemoryUserStore,
    Role, SignIn, User,
};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tower::ServiceExt;

const SECRET: &str = "api-test-secret-that-is-at-least-32-chars";

fn issuer() -> JwtIssuer {
    JwtIssuer::new(&JwtConfig {
        secret: SECRET.to_string(),
        ..JwtConfig::default()
    })
    .unwrap()
}

fn test_app() -> Router {
    let backend = Arc::new(LocalBackend::new(Arc::new(MemoryUserStore::seeded()), issuer()));
    app(AppState::new(backend, BearerAuth::new(issuer())))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn login_token(email: &str, password: &str) -> String {
    let (status, body) = send(test_app(), login_request(json!({"email": email, "password": password}))).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_login_success() {
    let (status, body) = send(
        test_app(),
        login_request(json!({"email": "admin@example.com", "password": "admin123", "role": "faculty"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["name"], "Admin User");
    assert_eq!(body["user"]["id"], "1");
    assert!(body["user"].get("password").is_none());

    let token = body["token"].as_str().unwrap();
    let user = issuer().authenticate(token).unwrap();
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    for body in [
        json!({"email": "admin@example.com", "password": "wrong"}),
        json!({"email": "ghost@example.com", "password": "admin123"}),
    ] {
        let (status, body) = send(test_app(), login_request(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Invalid email or password"}));
    }
}

#[tokio::test]
async fn test_login_missing_fields() {
    let (status, body) = send(test_app(), login_request(json!({"email": "admin@example.com"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");
}

#[tokio::test]
async fn test_login_unparseable_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_me_with_token() {
    let token = login_token("hod@example.com", "hod123").await;
    let (status, body) = send(test_app(), bearer_get("/api/auth/me", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "hod");
    assert_eq!(body["user"]["email"], "hod@example.com");
}

#[tokio::test]
async fn test_me_rejects_missing_and_bad_tokens() {
    let request = Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap();
    let (status, _) = send(test_app(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(test_app(), bearer_get("/api/auth/me", "not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other = JwtIssuer::new(&JwtConfig {
        secret: "a-completely-different-secret-of-some-length".to_string(),
        ..JwtConfig::default()
    })
    .unwrap();
    let forged = other
        .issue(&User::new("1", "admin@example.com", "Admin User", Role::Admin))
        .unwrap();
    let (status, _) = send(test_app(), bearer_get("/api/auth/me", &forged.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_rejects_expired_token() {
    let stale = issuer()
        .issue_at(
            &User::new("3", "faculty@example.com", "Faculty User", Role::Faculty),
            Utc::now() - Duration::days(2),
        )
        .unwrap();

    let (status, body) = send(test_app(), bearer_get("/api/auth/me", &stale.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Your session has expired, please sign in again");
}

#[tokio::test]
async fn test_navigation_for_faculty() {
    let token = login_token("faculty@example.com", "faculty123").await;
    let (status, body) = send(test_app(), bearer_get("/api/auth/navigation", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "faculty");
    assert_eq!(body["landing_route"], "/faculty");
    let items = body["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items
        .iter()
        .all(|item| item["path"].as_str().unwrap().starts_with("/faculty")));
}

#[tokio::test]
async fn test_access_stays_inside_role_tree() {
    let token = login_token("hod@example.com", "hod123").await;

    let (status, body) = send(test_app(), bearer_get("/api/auth/access?path=/hod/timetable", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    let (status, _) = send(test_app(), bearer_get("/api/auth/access?path=/admin", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_state_from_default_config() {
    let state = AppState::from_config(&AuthConfig::default()).await.unwrap();
    let (status, _) = send(
        app(state),
        login_request(json!({"email": "hod@example.com", "password": "hod123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

struct StalledBackend;

#[async_trait]
impl IdentityBackend for StalledBackend {
    async fn sign_in(&self, _email: &str, _password: &str) -> AuthResult<SignIn> {
        tokio::time::sleep(StdDuration::from_secs(60)).await;
        Err(AuthError::InvalidCredentials)
    }

    fn backend_name(&self) -> &str {
        "stalled"
    }
}

struct UnreachableBackend;

#[async_trait]
impl IdentityBackend for UnreachableBackend {
    async fn sign_in(&self, _email: &str, _password: &str) -> AuthResult<SignIn> {
        Err(AuthError::provider_unavailable("connection refused"))
    }

    fn backend_name(&self) -> &str {
        "unreachable"
    }
}

#[tokio::test]
async fn test_login_timeout_is_internal_error() {
    let state = AppState::new(Arc::new(StalledBackend), BearerAuth::new(issuer()))
        .with_timeout(StdDuration::from_millis(50));
    let (status, body) = send(
        app(state),
        login_request(json!({"email": "admin@example.com", "password": "admin123"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_login_backend_outage_is_internal_error() {
    let state = AppState::new(Arc::new(UnreachableBackend), BearerAuth::new(issuer()));
    let (status, body) = send(
        app(state),
        login_request(json!({"email": "admin@example.com", "password": "admin123"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
