//! Seams between the auth context and its collaborators

use crate::user::{CredentialRecord, User};
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verified identity together with the bearer token that proves it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignIn {
    pub user: User,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Identity backend: local credential table or delegated provider.
///
/// Chosen once from configuration; the auth context only sees this trait.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Verify an email/password pair and return the identity plus token
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SignIn>;

    /// Google OAuth popup sign-in
    async fn sign_in_with_google(&self) -> AuthResult<SignIn> {
        Err(AuthError::config_error(format!(
            "Google sign-in is not available with the {} backend",
            self.backend_name()
        )))
    }

    /// Get backend name for identification
    fn backend_name(&self) -> &str;
}

/// Lookup of credential records by email
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<CredentialRecord>>;
}

/// Credential returned by the Google popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleCredential {
    IdToken(String),
    AccessToken(String),
}

/// The interactive half of the OAuth popup flow.
///
/// Implementations open the consent popup and wait for it; closing the popup
/// resolves to `AuthError::PopupCancelled`.
#[async_trait]
pub trait PopupFlow: Send + Sync {
    async fn obtain_google_credential(&self) -> AuthResult<GoogleCredential>;
}

/// Password hasher trait for different hashing algorithms
pub trait PasswordHasher: Send + Sync {
    /// Hash a password
    fn hash_password(&self, password: &str) -> AuthResult<String>;

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool>;

    /// Get the hasher name
    fn hasher_name(&self) -> &str;
}
