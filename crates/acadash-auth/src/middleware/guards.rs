//! Role guards for dashboard routes

use crate::router::can_access;
use crate::user::{Role, User};
use crate::{AuthError, AuthResult};

/// Allows a request through when the user holds one of the listed roles and
/// the path lies inside that role's dashboard tree.
#[derive(Debug, Clone, Default)]
pub struct RoleGuard {
    allowed: Vec<Role>,
}

impl RoleGuard {
    /// Guard that only checks the role's own dashboard tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to specific roles
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    pub fn check(&self, user: &User, path: &str) -> AuthResult<()> {
        if !self.allowed.is_empty() && !self.allowed.contains(&user.role) {
            return Err(AuthError::access_denied(format!(
                "role {} may not access {}",
                user.role, path
            )));
        }
        if !can_access(user.role, path) {
            return Err(AuthError::access_denied(format!(
                "role {} may not access {}",
                user.role, path
            )));
        }
        Ok(())
    }
}
