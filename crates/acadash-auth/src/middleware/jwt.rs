//! Bearer token authentication for protected HTTP routes

use crate::providers::jwt::JwtIssuer;
use crate::user::User;
use crate::{AuthError, AuthResult};

// Default values for bearer authentication
const DEFAULT_HEADER_NAME: &str = "Authorization";
const DEFAULT_TOKEN_PREFIX: &str = "Bearer ";

/// Extracts and validates locally issued bearer tokens
#[derive(Debug, Clone)]
pub struct BearerAuth {
    issuer: JwtIssuer,
    config: BearerAuthConfig,
}

/// Configuration for bearer authentication
#[derive(Debug, Clone)]
pub struct BearerAuthConfig {
    /// Header name for token extraction
    pub header_name: String,

    /// Token prefix (e.g., "Bearer ")
    pub token_prefix: String,
}

impl Default for BearerAuthConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_HEADER_NAME.to_string(),
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
        }
    }
}

impl BearerAuth {
    pub fn new(issuer: JwtIssuer) -> Self {
        Self::with_config(issuer, BearerAuthConfig::default())
    }

    pub fn with_config(issuer: JwtIssuer, config: BearerAuthConfig) -> Self {
        Self { issuer, config }
    }

    pub fn header_name(&self) -> &str {
        &self.config.header_name
    }

    /// Extract token from the authorization header value
    pub fn extract_token<'a>(&self, header: Option<&'a str>) -> AuthResult<&'a str> {
        let header = header.ok_or_else(|| AuthError::token_error("Missing authorization token"))?;
        let token = header
            .strip_prefix(&self.config.token_prefix)
            .ok_or_else(|| {
                AuthError::token_error(format!(
                    "Token must start with '{}'",
                    self.config.token_prefix
                ))
            })?
            .trim();

        if token.is_empty() {
            return Err(AuthError::token_error("Missing authorization token"));
        }
        Ok(token)
    }

    /// Validate the header's token and return the user it carries
    pub fn authenticate(&self, header: Option<&str>) -> AuthResult<User> {
        let token = self.extract_token(header)?;
        self.issuer.authenticate(token)
    }
}
