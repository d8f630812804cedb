//! JWT session token issuing and decoding

use crate::config::JwtConfig;
use crate::traits::SignIn;
use crate::user::{Claims, User};
use crate::{AuthError, AuthResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;

/// Lifetime of locally issued session tokens
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Mints and decodes HS256 session tokens for the local backend
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtIssuer {
    /// Create a new issuer from configuration
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::config_error("JWT secret must not be empty"));
        }
        if config.uses_fallback_secret() {
            tracing::warn!("Signing session tokens with the built-in development secret");
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
        })
    }

    /// Token lifetime, fixed at 24 hours
    pub fn expiry(&self) -> Duration {
        Duration::seconds(TOKEN_LIFETIME_SECS)
    }

    /// Issue a token for `user`, valid from now
    pub fn issue(&self, user: &User) -> AuthResult<SignIn> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token with an explicit issue time
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> AuthResult<SignIn> {
        // JWT timestamps are whole seconds
        let issued_at = Utc
            .timestamp_opt(issued_at.timestamp(), 0)
            .single()
            .ok_or_else(|| AuthError::token_error("issue time out of range"))?;
        let expires_at = issued_at + self.expiry();

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            name: user.name.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SignIn {
            user: user.clone(),
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature, issuer and expiry, returning the embedded claims
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Decode and rebuild the user in one step
    pub fn authenticate(&self, token: &str) -> AuthResult<User> {
        self.decode(token)?.to_user()
    }
}

#[derive(Debug, Deserialize)]
struct LifetimeClaims {
    iat: Option<i64>,
    exp: i64,
}

/// Read `iat`/`exp` from any JWT without checking its signature.
///
/// Used on tokens this process already trusted when it stored them: locally
/// issued tokens and provider ID tokens alike. Never use it to authenticate.
pub fn token_lifetime(token: &str) -> AuthResult<(DateTime<Utc>, DateTime<Utc>)> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let data = decode::<LifetimeClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::storage_corrupt(format!("unreadable token: {}", e)))?;

    let expires_at = Utc
        .timestamp_opt(data.claims.exp, 0)
        .single()
        .ok_or_else(|| AuthError::storage_corrupt("token exp out of range"))?;
    let issued_at = match data.claims.iat {
        Some(iat) => Utc
            .timestamp_opt(iat, 0)
            .single()
            .ok_or_else(|| AuthError::storage_corrupt("token iat out of range"))?,
        None => expires_at,
    };

    Ok((issued_at, expires_at))
}
