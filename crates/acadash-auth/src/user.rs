//! Users, roles and the identity claims carried in session tokens

use crate::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dashboard role. The set is closed; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Hod,
    Faculty,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Hod, Role::Faculty];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Hod => "hod",
            Role::Faculty => "faculty",
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "hod" => Ok(Role::Hod),
            "faculty" => Ok(Role::Faculty),
            _ => Err(AuthError::unknown_role(s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated principal as the dashboard sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role,
        }
    }

    /// Case-insensitive email comparison
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// JWT claims for locally issued session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Kept as text so a tampered or legacy role surfaces as `UnknownRole`
    /// when the claims are turned back into a `User`.
    pub role: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    /// Rebuild the user snapshot embedded in the token
    pub fn to_user(&self) -> AuthResult<User> {
        Ok(User {
            id: self.sub.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.parse()?,
        })
    }
}

/// Credential record as held by a user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Plaintext for the mock table, or an Argon2 PHC string
    pub secret: String,
}

impl CredentialRecord {
    pub fn to_user(&self) -> User {
        User::new(&self.id, &self.email, &self.name, self.role)
    }
}
