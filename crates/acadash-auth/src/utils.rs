//! Credential checks and password hashing

use crate::{AuthError, AuthResult};

#[cfg(feature = "argon2")]
use crate::PasswordHasher;
#[cfg(feature = "argon2")]
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
#[cfg(feature = "argon2")]
use rand::thread_rng;

/// PHC prefix that marks a stored secret as an Argon2 hash
pub const ARGON2_PREFIX: &str = "$argon2";

/// Presence check for a login form submission.
///
/// Returns the trimmed email. Format validation is left to the form.
pub fn require_credentials<'a>(email: &'a str, password: &str) -> AuthResult<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthError::malformed("email is required"));
    }
    if password.is_empty() {
        return Err(AuthError::malformed("password is required"));
    }
    Ok(email)
}

/// Compare a presented password against a stored secret.
///
/// Plaintext secrets are compared with exact string equality, which is what
/// the seeded mock table expects. Secrets carrying the Argon2 PHC prefix are
/// verified as hashes.
pub fn verify_secret(stored: &str, presented: &str) -> AuthResult<bool> {
    if stored.starts_with(ARGON2_PREFIX) {
        #[cfg(feature = "argon2")]
        return Argon2Hasher::default().verify_password(presented, stored);

        #[cfg(not(feature = "argon2"))]
        return Err(AuthError::config_error(
            "stored secret is an Argon2 hash but the argon2 feature is disabled",
        ));
    }

    Ok(stored == presented)
}

/// Argon2 password hasher implementation
#[cfg(feature = "argon2")]
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
}

#[cfg(feature = "argon2")]
impl Argon2Hasher {
    /// Create a new Argon2 hasher with custom parameters
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Cheap parameters for seed scripts and tests
    pub fn development() -> Self {
        Self::new(4096, 2, 1)
    }

    fn argon2(&self) -> AuthResult<Argon2<'static>> {
        let params = argon2::Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::config_error(e.to_string()))?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }
}

#[cfg(feature = "argon2")]
impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost: 19456, // 19 MB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

#[cfg(feature = "argon2")]
impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut thread_rng());
        let hash = self.argon2()?.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash)?;

        // Parameters come from the PHC string, not from self.
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn hasher_name(&self) -> &str {
        "argon2"
    }
}
