//! Authentication configuration types and utilities

use crate::user::Role;
use crate::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Signing secret used when `JWT_SECRET` is not set.
///
/// Mock deployments rely on it; production configs must replace it.
pub const DEFAULT_JWT_SECRET: &str = "acadash-dev-secret-change-in-production";

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Which identity backend verifies credentials
    #[serde(default)]
    pub backend: BackendKind,

    /// Local token issuing
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Delegated provider settings
    #[serde(default)]
    pub firebase: FirebaseConfig,

    /// Client-side session persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Hard timeout for provider round-trips, in seconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Role for provider accounts with no record in the user store
    #[serde(default = "default_role")]
    pub default_role: Role,

    /// Optional user database
    #[serde(default)]
    pub database_url: Option<String>,
}

/// Identity backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Firebase,
}

impl FromStr for BackendKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "mock" => Ok(BackendKind::Local),
            "firebase" => Ok(BackendKind::Firebase),
            other => Err(AuthError::config_error(format!(
                "unknown auth backend '{}', expected local or firebase",
                other
            ))),
        }
    }
}

/// JWT token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret
    #[serde(default = "default_jwt_secret")]
    pub secret: String,

    /// JWT issuer
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
}

/// Firebase Authentication REST settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Web API key of the Firebase project
    #[serde(default)]
    pub api_key: String,

    /// Identity Toolkit base URL
    #[serde(default = "default_firebase_url")]
    pub base_url: String,

    /// Redirect URI registered for the Google popup
    #[serde(default = "default_request_uri")]
    pub request_uri: String,
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JSON file backing the session, in-memory when absent
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Storage key holding the bearer token
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Storage key holding the serialized user
    #[serde(default = "default_user_key")]
    pub user_key: String,
}

// Default value functions
fn default_provider_timeout() -> u64 {
    10
}
fn default_role() -> Role {
    Role::Faculty
}
fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}
fn default_jwt_issuer() -> String {
    "acadash".to_string()
}
fn default_firebase_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}
fn default_request_uri() -> String {
    "http://localhost".to_string()
}
fn default_token_key() -> String {
    "token".to_string()
}
fn default_user_key() -> String {
    "user".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            jwt: JwtConfig::default(),
            firebase: FirebaseConfig::default(),
            session: SessionConfig::default(),
            provider_timeout_secs: default_provider_timeout(),
            default_role: default_role(),
            database_url: None,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            issuer: default_jwt_issuer(),
        }
    }
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_firebase_url(),
            request_uri: default_request_uri(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            token_key: default_token_key(),
            user_key: default_user_key(),
        }
    }
}

impl JwtConfig {
    /// Whether the hardcoded fallback secret is in use
    pub fn uses_fallback_secret(&self) -> bool {
        self.secret == DEFAULT_JWT_SECRET
    }
}

impl AuthConfig {
    /// Mock backend with the fallback secret
    pub fn development() -> Self {
        Self::default()
    }

    /// Firebase backend; the secret must still be injected
    pub fn production() -> Self {
        let mut config = Self::default();
        config.backend = BackendKind::Firebase;
        config.jwt.secret = String::new();
        config
    }

    /// Provider timeout as a duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> AuthResult<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var("AUTH_BACKEND") {
            config.backend = value.parse()?;
        }
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.jwt.secret = secret,
            _ => tracing::warn!(
                "JWT_SECRET is not set, falling back to the built-in development secret"
            ),
        }
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            config.jwt.issuer = issuer;
        }
        if let Ok(key) = env::var("FIREBASE_API_KEY") {
            config.firebase.api_key = key;
        }
        if let Ok(url) = env::var("FIREBASE_AUTH_URL") {
            config.firebase.base_url = url;
        }
        if let Ok(value) = env::var("AUTH_PROVIDER_TIMEOUT_SECS") {
            config.provider_timeout_secs = parse_number("AUTH_PROVIDER_TIMEOUT_SECS", &value)?;
        }
        if let Ok(value) = env::var("AUTH_DEFAULT_ROLE") {
            config.default_role = value
                .parse()
                .map_err(|_| AuthError::config_error(format!("invalid AUTH_DEFAULT_ROLE '{}'", value)))?;
        }
        if let Ok(path) = env::var("SESSION_STORAGE_PATH") {
            config.session.storage_path = Some(PathBuf::from(path));
        }
        if let Ok(key) = env::var("SESSION_TOKEN_KEY") {
            config.session.token_key = key;
        }
        if let Ok(key) = env::var("SESSION_USER_KEY") {
            config.session.user_key = key;
        }
        config.database_url = env::var("DATABASE_URL").ok();

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> AuthResult<()> {
        if self.jwt.secret.is_empty() {
            return Err(AuthError::config_error("JWT secret must not be empty"));
        }

        if self.provider_timeout_secs == 0 {
            return Err(AuthError::config_error("Provider timeout must be greater than 0"));
        }

        if self.backend == BackendKind::Firebase && self.firebase.api_key.is_empty() {
            return Err(AuthError::config_error(
                "FIREBASE_API_KEY is required for the firebase backend",
            ));
        }

        if self.session.token_key == self.session.user_key {
            return Err(AuthError::config_error(
                "Session token and user keys must differ",
            ));
        }

        Ok(())
    }

    /// Stricter validation for production deployments
    pub fn validate_for_production(&self) -> AuthResult<()> {
        self.validate()?;

        if self.jwt.uses_fallback_secret() {
            return Err(AuthError::config_error(
                "The built-in JWT secret cannot be used in production",
            ));
        }

        if self.jwt.secret.len() < 32 {
            return Err(AuthError::config_error("JWT secret must be at least 32 characters"));
        }

        Ok(())
    }
}

fn parse_number(field: &str, value: &str) -> AuthResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| AuthError::config_error(format!("{} must be a number, got '{}'", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.session.token_key, "token");
        assert_eq!(config.session.user_key, "user");
        assert_eq!(config.default_role, Role::Faculty);
        assert!(config.jwt.uses_fallback_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_config_requires_secret() {
        let mut config = AuthConfig::production();
        config.firebase.api_key = "key".to_string();
        assert!(config.validate().is_err());

        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_ok());
        assert!(config.validate_for_production().is_err());

        config.jwt.secret = "a-production-secret-that-is-long-enough".to_string();
        assert!(config.validate_for_production().is_ok());
    }

    #[test]
    fn test_fallback_secret_rejected_in_production() {
        let config = AuthConfig::development();
        assert!(config.validate().is_ok());
        assert!(config.validate_for_production().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AuthConfig::default();
        config.backend = BackendKind::Firebase;
        assert!(config.validate().is_err());

        config.firebase.api_key = "key".to_string();
        assert!(config.validate().is_ok());

        config.session.user_key = "token".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("local".parse::<BackendKind>().unwrap(), BackendKind::Local);
        assert_eq!("Firebase".parse::<BackendKind>().unwrap(), BackendKind::Firebase);
        assert!("ldap".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AuthConfig = serde_json::from_str(r#"{"backend": "firebase"}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Firebase);
        assert_eq!(config.provider_timeout(), Duration::from_secs(10));
        assert_eq!(config.firebase.base_url, "https://identitytoolkit.googleapis.com/v1");
    }

    #[test]
    fn test_token_lifetime_is_not_configurable() {
        let config: JwtConfig =
            serde_json::from_str(r#"{"secret": "s", "expiry_secs": 60}"#).unwrap();
        let issuer = crate::providers::JwtIssuer::new(&config).unwrap();
        assert_eq!(issuer.expiry(), chrono::Duration::hours(24));
    }
}
