//! Authentication error taxonomy

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown for any failed email/password check.
///
/// Absent accounts and wrong passwords share it so the login form cannot be
/// used to enumerate registered emails.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Authentication errors
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// Missing or empty email/password
    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    /// Wrong email or password
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    /// Identity provider or network outage
    #[error("Identity provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    /// The user closed the OAuth popup
    #[error("Sign-in popup was closed before completing")]
    PopupCancelled,

    /// A role outside the closed admin/hod/faculty set
    #[error("Unknown role: {role}")]
    UnknownRole { role: String },

    /// Persisted session could not be read back
    #[error("Stored session is corrupt: {message}")]
    StorageCorrupt { message: String },

    /// The session token is past its expiry
    #[error("Session expired")]
    TokenExpired,

    /// A protected action was attempted without any session
    #[error("Not signed in")]
    NotAuthenticated,

    /// Token could not be signed or decoded
    #[error("Token error: {message}")]
    TokenError { message: String },

    /// Role may not reach the requested page
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Another login is already running
    #[error("A sign-in is already in progress")]
    LoginInProgress,

    /// Configuration errors
    #[error("Authentication configuration error: {message}")]
    ConfigurationError { message: String },

    /// User store errors
    #[error("Database error during authentication: {message}")]
    DatabaseError { message: String },
}

impl AuthError {
    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedRequest { .. } => "MALFORMED_REQUEST",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            AuthError::PopupCancelled => "POPUP_CANCELLED",
            AuthError::UnknownRole { .. } => "UNKNOWN_ROLE",
            AuthError::StorageCorrupt { .. } => "STORAGE_CORRUPT",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::NotAuthenticated => "NOT_AUTHENTICATED",
            AuthError::TokenError { .. } => "TOKEN_ERROR",
            AuthError::AccessDenied { .. } => "ACCESS_DENIED",
            AuthError::LoginInProgress => "LOGIN_IN_PROGRESS",
            AuthError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AuthError::DatabaseError { .. } => "DATABASE_ERROR",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MalformedRequest { .. } => 400,
            AuthError::InvalidCredentials => 401,
            AuthError::TokenExpired => 401,
            AuthError::TokenError { .. } => 401,
            AuthError::NotAuthenticated => 401,
            AuthError::PopupCancelled => 400,
            AuthError::AccessDenied { .. } => 403,
            AuthError::LoginInProgress => 409,
            AuthError::ProviderUnavailable { .. } => 503,
            AuthError::UnknownRole { .. } => 500,
            AuthError::StorageCorrupt { .. } => 500,
            AuthError::ConfigurationError { .. } => 500,
            AuthError::DatabaseError { .. } => 500,
        }
    }

    /// Human-readable message for the login form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::MalformedRequest { .. } => "Email and password are required".to_string(),
            AuthError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AuthError::ProviderUnavailable { .. } => {
                "Sign-in service is unavailable, please try again".to_string()
            }
            AuthError::PopupCancelled => "Sign-in was cancelled".to_string(),
            AuthError::TokenExpired => "Your session has expired, please sign in again".to_string(),
            AuthError::LoginInProgress => "A sign-in is already in progress".to_string(),
            AuthError::NotAuthenticated => "Please sign in to continue".to_string(),
            AuthError::AccessDenied { .. } => "You do not have access to this page".to_string(),
            AuthError::UnknownRole { .. }
            | AuthError::StorageCorrupt { .. }
            | AuthError::TokenError { .. }
            | AuthError::ConfigurationError { .. }
            | AuthError::DatabaseError { .. } => {
                "Something went wrong while signing in".to_string()
            }
        }
    }

    /// Whether the user can fix the situation by retrying or correcting input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedRequest { .. }
                | AuthError::InvalidCredentials
                | AuthError::ProviderUnavailable { .. }
                | AuthError::PopupCancelled
                | AuthError::LoginInProgress
                | AuthError::StorageCorrupt { .. }
        )
    }

    /// Whether the error ends the current session
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::UnknownRole { .. } | AuthError::TokenExpired)
    }

    /// Create a malformed request error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest { message: message.into() }
    }

    /// Create a provider unavailable error
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable { message: message.into() }
    }

    /// Create an unknown role error
    pub fn unknown_role(role: impl Into<String>) -> Self {
        Self::UnknownRole { role: role.into() }
    }

    /// Create a storage corruption error
    pub fn storage_corrupt(message: impl Into<String>) -> Self {
        Self::StorageCorrupt { message: message.into() }
    }

    /// Create a token error
    pub fn token_error(message: impl Into<String>) -> Self {
        Self::TokenError { message: message.into() }
    }

    /// Create an access denied error
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied { message: message.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Create a database error
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::DatabaseError { message: message.into() }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::token_error(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::provider_unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage_corrupt(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::storage_corrupt(err.to_string())
    }
}

#[cfg(feature = "argon2")]
impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::config_error(format!("invalid password hash: {}", err))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::database_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::InvalidCredentials.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(AuthError::malformed("email").error_code(), "MALFORMED_REQUEST");
        assert_eq!(AuthError::PopupCancelled.error_code(), "POPUP_CANCELLED");
        assert_eq!(AuthError::unknown_role("dean").error_code(), "UNKNOWN_ROLE");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::malformed("password").status_code(), 400);
        assert_eq!(AuthError::provider_unavailable("down").status_code(), 503);
        assert_eq!(AuthError::access_denied("/admin").status_code(), 403);
        assert_eq!(AuthError::config_error("test").status_code(), 500);
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid email or password");
        assert_eq!(AuthError::InvalidCredentials.user_message(), "Invalid email or password");
    }

    #[test]
    fn test_user_messages_are_kind_specific() {
        let malformed = AuthError::malformed("email is required").user_message();
        let provider = AuthError::provider_unavailable("timeout").user_message();
        assert_ne!(malformed, provider);
        assert_ne!(provider, AuthError::InvalidCredentials.user_message());
    }

    #[test]
    fn test_classification() {
        assert!(AuthError::InvalidCredentials.is_recoverable());
        assert!(AuthError::storage_corrupt("bad json").is_recoverable());
        assert!(AuthError::unknown_role("dean").is_fatal());
        assert!(AuthError::TokenExpired.is_fatal());
        assert!(!AuthError::PopupCancelled.is_fatal());
        assert!(!AuthError::NotAuthenticated.is_fatal());
        assert_ne!(
            AuthError::NotAuthenticated.user_message(),
            AuthError::TokenExpired.user_message()
        );
    }

    #[test]
    fn test_error_display() {
        let err = AuthError::unknown_role("dean");
        assert_eq!(err.to_string(), "Unknown role: dean");

        let err = AuthError::provider_unavailable("connection refused");
        assert_eq!(err.to_string(), "Identity provider unavailable: connection refused");
    }
}
