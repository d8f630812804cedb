//! Firebase Authentication backend (Identity Toolkit REST API)

use crate::config::{AuthConfig, FirebaseConfig};
use crate::providers::jwt::token_lifetime;
use crate::traits::{GoogleCredential, IdentityBackend, PopupFlow, SignIn, UserStore};
use crate::user::{Role, User};
use crate::utils::require_credentials;
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Delegates credential checks to Firebase and uses its ID token as the
/// session token.
pub struct FirebaseBackend {
    client: reqwest::Client,
    config: FirebaseConfig,
    roles: Option<Arc<dyn UserStore>>,
    default_role: Role,
    popup: Option<Arc<dyn PopupFlow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpSignInRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

impl FirebaseBackend {
    /// Create a backend from the auth configuration
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        if config.firebase.api_key.is_empty() {
            return Err(AuthError::config_error("Firebase API key is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.provider_timeout())
            .build()
            .map_err(|e| AuthError::config_error(e.to_string()))?;

        Ok(Self {
            client,
            config: config.firebase.clone(),
            roles: None,
            default_role: config.default_role,
            popup: None,
        })
    }

    /// Look up dashboard roles for provider accounts in a user store
    pub fn with_role_directory(mut self, store: Arc<dyn UserStore>) -> Self {
        self.roles = Some(store);
        self
    }

    /// Enable Google sign-in through the given popup flow
    pub fn with_popup(mut self, popup: Arc<dyn PopupFlow>) -> Self {
        self.popup = Some(popup);
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.config.base_url.trim_end_matches('/'),
            method,
            self.config.api_key
        )
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> AuthResult<ProviderSignInResponse> {
        let response = self.client.post(self.endpoint(method)).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<ProviderSignInResponse>()
                .await
                .map_err(|e| AuthError::provider_unavailable(format!("unexpected response: {}", e)));
        }

        if status.is_server_error() {
            return Err(AuthError::provider_unavailable(format!(
                "identity provider returned {}",
                status
            )));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ProviderErrorBody>(&body) {
            Ok(parsed) => Err(map_provider_error(&parsed.error.message)),
            Err(_) => Err(AuthError::provider_unavailable(format!(
                "identity provider returned {}",
                status
            ))),
        }
    }

    async fn resolve_role(&self, email: &str) -> AuthResult<Role> {
        if let Some(store) = &self.roles {
            if let Some(record) = store.find_by_email(email).await? {
                return Ok(record.role);
            }
        }
        Ok(self.default_role)
    }

    async fn into_sign_in(&self, response: ProviderSignInResponse) -> AuthResult<SignIn> {
        let email = response
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AuthError::provider_unavailable("identity provider returned no email"))?;
        let role = self.resolve_role(&email).await?;
        let name = response
            .display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.clone());

        let (issued_at, expires_at) = match token_lifetime(&response.id_token) {
            Ok(lifetime) => lifetime,
            Err(_) => {
                let now = Utc::now();
                let secs = response
                    .expires_in
                    .as_deref()
                    .and_then(|s| s.parse::<i64>().ok())
                    .unwrap_or(3600);
                (now, now + Duration::seconds(secs))
            }
        };

        Ok(SignIn {
            user: User::new(response.local_id, email, name, role),
            token: response.id_token,
            issued_at,
            expires_at,
        })
    }
}

/// Translate Identity Toolkit error messages into the auth taxonomy.
///
/// Messages look like `INVALID_PASSWORD` or
/// `TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account...`.
pub fn map_provider_error(message: &str) -> AuthError {
    let code = message.split([' ', ':']).next().unwrap_or_default();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "MISSING_EMAIL" | "MISSING_PASSWORD" | "INVALID_EMAIL" => AuthError::malformed(code),
        "POPUP_CLOSED_BY_USER" | "USER_CANCELLED" => AuthError::PopupCancelled,
        _ => AuthError::provider_unavailable(message),
    }
}

#[async_trait]
impl IdentityBackend for FirebaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SignIn> {
        let email = require_credentials(email, password)?;
        let request = PasswordSignInRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response = self.call("signInWithPassword", &request).await?;
        self.into_sign_in(response).await
    }

    async fn sign_in_with_google(&self) -> AuthResult<SignIn> {
        let popup = self
            .popup
            .as_ref()
            .ok_or_else(|| AuthError::config_error("Google sign-in popup is not configured"))?;

        let post_body = match popup.obtain_google_credential().await? {
            GoogleCredential::IdToken(token) => format!("id_token={}&providerId=google.com", token),
            GoogleCredential::AccessToken(token) => {
                format!("access_token={}&providerId=google.com", token)
            }
        };

        let request = IdpSignInRequest {
            post_body,
            request_uri: &self.config.request_uri,
            return_idp_credential: true,
            return_secure_token: true,
        };
        let response = self.call("signInWithIdp", &request).await?;
        self.into_sign_in(response).await
    }

    fn backend_name(&self) -> &str {
        "firebase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_provider_error() {
        assert_eq!(map_provider_error("EMAIL_NOT_FOUND"), AuthError::InvalidCredentials);
        assert_eq!(map_provider_error("INVALID_PASSWORD"), AuthError::InvalidCredentials);
        assert_eq!(
            map_provider_error("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        );
        assert!(matches!(
            map_provider_error("MISSING_PASSWORD"),
            AuthError::MalformedRequest { .. }
        ));
        assert!(matches!(
            map_provider_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"),
            AuthError::ProviderUnavailable { .. }
        ));
    }

    #[test]
    fn test_requires_api_key() {
        let config = AuthConfig::default();
        assert!(FirebaseBackend::new(&config).is_err());
    }

    #[test]
    fn test_endpoint_format() {
        let mut config = AuthConfig::default();
        config.firebase.api_key = "abc".to_string();
        config.firebase.base_url = "http://127.0.0.1:9099/v1/".to_string();
        let backend = FirebaseBackend::new(&config).unwrap();
        assert_eq!(
            backend.endpoint("signInWithPassword"),
            "http://127.0.0.1:9099/v1/accounts:signInWithPassword?key=abc"
        );
    }

    #[tokio::test]
    async fn test_google_without_popup_is_config_error() {
        let mut config = AuthConfig::default();
        config.firebase.api_key = "abc".to_string();
        let backend = FirebaseBackend::new(&config).unwrap();
        assert!(matches!(
            backend.sign_in_with_google().await,
            Err(AuthError::ConfigurationError { .. })
        ));
    }
}
