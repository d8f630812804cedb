//! Local credential-table backend

use crate::providers::jwt::JwtIssuer;
use crate::traits::{IdentityBackend, SignIn, UserStore};
use crate::user::User;
use crate::utils::{require_credentials, verify_secret};
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Verifies credentials against a `UserStore` and signs its own tokens
#[derive(Clone)]
pub struct LocalBackend {
    store: Arc<dyn UserStore>,
    issuer: JwtIssuer,
}

impl LocalBackend {
    pub fn new(store: Arc<dyn UserStore>, issuer: JwtIssuer) -> Self {
        Self { store, issuer }
    }

    /// The issuer, for decoding bearer tokens on protected routes
    pub fn issuer(&self) -> &JwtIssuer {
        &self.issuer
    }

    /// Credential check without issuing a token.
    ///
    /// Absent accounts and wrong passwords both yield `InvalidCredentials`.
    pub async fn verify(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = require_credentials(email, password)?;

        let Some(record) = self.store.find_by_email(email).await? else {
            tracing::debug!(email, "No credential record for email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_secret(&record.secret, password)? {
            tracing::debug!(email, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(record.to_user())
    }
}

#[async_trait]
impl IdentityBackend for LocalBackend {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SignIn> {
        let user = self.verify(email, password).await?;
        self.issuer.issue(&user)
    }

    fn backend_name(&self) -> &str {
        "local"
    }
}
