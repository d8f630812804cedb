//! Firebase backend against a local Identity Toolkit stand-in

use acadash_auth::{
    AuthConfig, AuthContext, AuthError, AuthResult, FirebaseBackend, GoogleCredential,
    IdentityBackend, MemoryStorage, MemoryUserStore, PopupFlow, Role, SessionStore,
};
use async_trait::async_trait;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

async fn identity_toolkit(uri: Uri, Json(body): Json<Value>) -> Response {
    let path = uri.path();
    if path.ends_with("accounts:signInWithIdp") {
        let post_body = body["postBody"].as_str().unwrap_or_default();
        if !post_body.contains("providerId=google.com") {
            return provider_error(StatusCode::BAD_REQUEST, "INVALID_IDP_RESPONSE");
        }
        return signed_in("g-42", "faculty@example.com", "Google Faculty");
    }

    if !path.ends_with("accounts:signInWithPassword") {
        return StatusCode::NOT_FOUND.into_response();
    }

    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("down@example.com"), _) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        (Some("hod@example.com"), Some("provider-pass")) => {
            signed_in("fb-hod", "hod@example.com", "Head of Department")
        }
        (Some("new@example.com"), Some("provider-pass")) => signed_in("fb-new", "new@example.com", ""),
        (Some("phone-only@example.com"), Some("provider-pass")) => Json(json!({
            "localId": "fb-phone",
            "idToken": "provider-id-token",
            "expiresIn": "3600"
        }))
        .into_response(),
        _ => provider_error(StatusCode::BAD_REQUEST, "INVALID_LOGIN_CREDENTIALS"),
    }
}

fn signed_in(local_id: &str, email: &str, display_name: &str) -> Response {
    Json(json!({
        "localId": local_id,
        "email": email,
        "displayName": display_name,
        "idToken": "provider-id-token",
        "refreshToken": "refresh",
        "expiresIn": "3600"
    }))
    .into_response()
}

fn provider_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": {"code": status.as_u16(), "message": message}}))).into_response()
}

async fn spawn_identity_toolkit() -> String {
    let app = Router::new().fallback(identity_toolkit);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

async fn backend() -> FirebaseBackend {
    let mut config = AuthConfig::default();
    config.firebase.api_key = "test-key".to_string();
    config.firebase.base_url = spawn_identity_toolkit().await;
    FirebaseBackend::new(&config)
        .unwrap()
        .with_role_directory(Arc::new(MemoryUserStore::seeded()))
}

#[tokio::test]
async fn test_provider_sign_in_takes_role_from_directory() {
    let sign_in = backend().await.sign_in("hod@example.com", "provider-pass").await.unwrap();
    assert_eq!(sign_in.user.id, "fb-hod");
    assert_eq!(sign_in.user.role, Role::Hod);
    assert_eq!(sign_in.user.name, "Head of Department");
    assert_eq!(sign_in.token, "provider-id-token");
    assert!(sign_in.expires_at > sign_in.issued_at);
}

#[tokio::test]
async fn test_unlisted_provider_account_gets_default_role() {
    let sign_in = backend().await.sign_in("new@example.com", "provider-pass").await.unwrap();
    assert_eq!(sign_in.user.role, Role::Faculty);
    assert_eq!(sign_in.user.name, "new@example.com");
}

#[tokio::test]
async fn test_provider_rejection_is_invalid_credentials() {
    let result = backend().await.sign_in("hod@example.com", "wrong").await;
    assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
}

#[tokio::test]
async fn test_provider_outage_is_unavailable() {
    let result = backend().await.sign_in("down@example.com", "whatever").await;
    assert!(matches!(result, Err(AuthError::ProviderUnavailable { .. })));
}

#[tokio::test]
async fn test_account_without_email_is_rejected() {
    let result = backend()
        .await
        .sign_in("phone-only@example.com", "provider-pass")
        .await;
    assert!(matches!(result, Err(AuthError::ProviderUnavailable { .. })));
}

struct ApprovingPopup;

#[async_trait]
impl PopupFlow for ApprovingPopup {
    async fn obtain_google_credential(&self) -> AuthResult<GoogleCredential> {
        Ok(GoogleCredential::IdToken("google-id-token".to_string()))
    }
}

struct ClosedPopup;

#[async_trait]
impl PopupFlow for ClosedPopup {
    async fn obtain_google_credential(&self) -> AuthResult<GoogleCredential> {
        Err(AuthError::PopupCancelled)
    }
}

#[tokio::test]
async fn test_google_login_through_context() {
    let backend = backend().await.with_popup(Arc::new(ApprovingPopup));
    let ctx = AuthContext::new(
        Arc::new(backend),
        SessionStore::with_storage(Arc::new(MemoryStorage::new())),
    );
    ctx.init();

    let outcome = ctx.login_with_google().await;
    assert!(outcome.success);
    assert_eq!(outcome.redirect_to.as_deref(), Some("/faculty"));
    assert_eq!(ctx.user().unwrap().id, "g-42");
}

#[tokio::test]
async fn test_closed_popup_is_not_an_error() {
    let backend = backend().await.with_popup(Arc::new(ClosedPopup));
    let ctx = AuthContext::new(
        Arc::new(backend),
        SessionStore::with_storage(Arc::new(MemoryStorage::new())),
    );
    ctx.init();

    let outcome = ctx.login_with_google().await;
    assert!(!outcome.success);
    assert!(outcome.is_cancelled());
    assert!(outcome.error.is_none());
    assert!(!ctx.is_authenticated());
}
