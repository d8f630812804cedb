//! Shared handler state

use acadash_auth::middleware::BearerAuth;
use acadash_auth::store::user_store_from_config;
use acadash_auth::{AuthConfig, AuthResult, BackendKind, IdentityBackend, JwtIssuer, LocalBackend};
use std::sync::Arc;
use std::time::Duration;

/// State cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn IdentityBackend>,
    pub bearer: BearerAuth,
    pub provider_timeout: Duration,
}

impl AppState {
    pub fn new(backend: Arc<dyn IdentityBackend>, bearer: BearerAuth) -> Self {
        Self {
            backend,
            bearer,
            provider_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Local credential table and locally signed tokens.
    ///
    /// The HTTP login is the mock backend; delegated sign-in happens in the
    /// client against the provider directly.
    pub async fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;
        if config.backend != BackendKind::Local {
            tracing::warn!(
                backend = ?config.backend,
                "HTTP login always verifies against the local user store"
            );
        }

        let issuer = JwtIssuer::new(&config.jwt)?;
        let users = user_store_from_config(config).await?;
        let backend = Arc::new(LocalBackend::new(users, issuer.clone()));

        Ok(Self::new(backend, BearerAuth::new(issuer)).with_timeout(config.provider_timeout()))
    }
}
