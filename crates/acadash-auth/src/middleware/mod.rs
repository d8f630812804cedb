//! Authentication logic for HTTP handlers
//!
//! Framework-agnostic pieces: the API crate feeds them header values and paths.

pub mod guards;
pub mod jwt;

pub use guards::RoleGuard;
pub use jwt::{BearerAuth, BearerAuthConfig};
