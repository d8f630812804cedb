//! # acadash-auth: Authentication and session core for acadash
//!
//! This crate verifies staff credentials, issues signed session tokens,
//! persists the session across restarts and routes each role to its
//! dashboard. The identity backend (local credential table or a delegated
//! provider) is chosen once from configuration.

pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod router;
pub mod session;
pub mod store;
pub mod traits;
pub mod user;
pub mod utils;

// Error handling
pub use error::{AuthError, INVALID_CREDENTIALS_MESSAGE};

// Core traits
pub use traits::{GoogleCredential, IdentityBackend, PasswordHasher, PopupFlow, SignIn, UserStore};

// Configuration
pub use config::{AuthConfig, BackendKind, FirebaseConfig, JwtConfig, SessionConfig};

// Domain types
pub use user::{CredentialRecord, Role, User};

// State machine and session persistence
pub use context::{AuthContext, AuthState, LoginOutcome};
pub use session::{ClientStorage, FileStorage, MemoryStorage, Session, SessionStore};

// Backends
pub use providers::{FirebaseBackend, JwtIssuer, LocalBackend};
pub use store::MemoryUserStore;

// Routing
pub use router::{landing_route_for, nav_items, NavItem, LOGIN_ROUTE};

/// Authentication result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication system version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
