//! Identity backend implementations
//!
//! - `local`: seeded or database credential table, tokens signed here
//! - `firebase`: delegated email/password and Google sign-in
//! - `jwt`: the token issuer used by the local backend

pub mod firebase;
pub mod jwt;
pub mod local;

pub use firebase::FirebaseBackend;
pub use jwt::{token_lifetime, JwtIssuer};
pub use local::LocalBackend;
