//! The auth context: one owned state machine per running client
//!
//! ```text
//! Loading ──init──▶ Unauthenticated ──login──▶ Authenticated
//!    │                     ▲                        │
//!    └──init (restored)────┼────────────────────────┤
//!                          └── logout / expiry ─────┘
//! ```
//!
//! Login, Google login and logout are serialized through a single transition
//! gate. A second login attempt while one is in flight is turned away with
//! `LoginInProgress`; logout waits for the in-flight transition to finish.

use crate::config::{AuthConfig, BackendKind};
use crate::providers::{FirebaseBackend, JwtIssuer, LocalBackend};
use crate::router::{landing_route_for, LOGIN_ROUTE};
use crate::session::{Session, SessionStore};
use crate::store::user_store_from_config;
use crate::traits::{IdentityBackend, PopupFlow, SignIn};
use crate::user::User;
use crate::{AuthError, AuthResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Observable state of the context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Persisted session not read yet
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Result of a login attempt, shaped for the login form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    /// The user closed the Google popup
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    #[serde(skip)]
    pub kind: Option<AuthError>,
}

impl LoginOutcome {
    fn succeeded(redirect_to: &str) -> Self {
        Self {
            success: true,
            error: None,
            redirect_to: Some(redirect_to.to_string()),
            cancelled: false,
            kind: None,
        }
    }

    fn failed(err: AuthError) -> Self {
        // A closed popup is not an error worth showing
        let cancelled = matches!(err, AuthError::PopupCancelled);
        Self {
            success: false,
            error: (!cancelled).then(|| err.user_message()),
            redirect_to: None,
            cancelled,
            kind: Some(err),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Authentication state machine shared by the whole client
pub struct AuthContext {
    backend: Arc<dyn IdentityBackend>,
    store: SessionStore,
    state: RwLock<AuthState>,
    transition: Mutex<()>,
    provider_timeout: Duration,
}

impl AuthContext {
    /// Create a context in the `Loading` state; call `init` next
    pub fn new(backend: Arc<dyn IdentityBackend>, store: SessionStore) -> Self {
        Self {
            backend,
            store,
            state: RwLock::new(AuthState::Loading),
            transition: Mutex::new(()),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Hard limit for backend round-trips
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Wire backend, user store and session storage from configuration.
    ///
    /// `popup` enables Google sign-in on the firebase backend.
    pub async fn from_config(
        config: &AuthConfig,
        popup: Option<Arc<dyn PopupFlow>>,
    ) -> AuthResult<Self> {
        config.validate()?;
        let users = user_store_from_config(config).await?;

        let backend: Arc<dyn IdentityBackend> = match config.backend {
            BackendKind::Local => Arc::new(LocalBackend::new(users, JwtIssuer::new(&config.jwt)?)),
            BackendKind::Firebase => {
                let mut backend = FirebaseBackend::new(config)?.with_role_directory(users);
                if let Some(popup) = popup {
                    backend = backend.with_popup(popup);
                }
                Arc::new(backend)
            }
        };

        tracing::info!(backend = backend.backend_name(), "Auth context configured");
        Ok(Self::new(backend, SessionStore::from_config(&config.session))
            .with_timeout(config.provider_timeout()))
    }

    /// Read persisted state and leave `Loading`.
    ///
    /// A stored, unexpired session is restored without asking for
    /// credentials. Expired or unreadable sessions are cleared. Calls after
    /// the first, or while a login holds the transition gate, leave the state
    /// untouched.
    pub fn init(&self) -> AuthState {
        let Ok(_gate) = self.transition.try_lock() else {
            tracing::debug!("Init skipped, a transition is in flight");
            return self.state();
        };
        self.restore()
    }

    /// Caller must hold the transition gate
    fn restore(&self) -> AuthState {
        if !self.is_loading() {
            return self.state();
        }

        let next = match self.store.load() {
            Some(session) if !session.is_expired() => {
                tracing::info!(user_id = %session.user.id, role = %session.user.role, "Restored stored session");
                AuthState::Authenticated(session)
            }
            Some(session) => {
                tracing::info!(user_id = %session.user.id, "Stored session has expired");
                self.clear_store();
                AuthState::Unauthenticated
            }
            None => AuthState::Unauthenticated,
        };

        *self.state.write() = next.clone();
        next
    }

    /// Email/password login
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let backend = self.backend.clone();
        let email = email.to_string();
        let password = password.to_string();
        self.run_login("password", async move { backend.sign_in(&email, &password).await })
            .await
    }

    /// Google OAuth popup login
    pub async fn login_with_google(&self) -> LoginOutcome {
        let backend = self.backend.clone();
        self.run_login("google", async move { backend.sign_in_with_google().await })
            .await
    }

    /// Clear the session from any state. Returns the login route.
    pub async fn logout(&self) -> &'static str {
        let _gate = self.transition.lock().await;
        self.end_session("logout");
        LOGIN_ROUTE
    }

    /// Gate for protected actions.
    ///
    /// An expired token forces the context back to `Unauthenticated` and
    /// fails with `TokenExpired`; no session at all is `NotAuthenticated`.
    pub async fn require_session(&self) -> AuthResult<Session> {
        let session = self.state.read().session().cloned();
        match session {
            Some(session) if !session.is_expired() => Ok(session),
            Some(_) => {
                let _gate = self.transition.lock().await;
                // Re-check under the gate; a login may have replaced it
                if let Some(current) = self.state.read().session() {
                    if !current.is_expired() {
                        return Ok(current.clone());
                    }
                }
                self.end_session("expired");
                Err(AuthError::TokenExpired)
            }
            None => Err(AuthError::NotAuthenticated),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().session().map(|session| session.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().session().map(|session| session.token.clone())
    }

    /// True only while the initial store read is pending
    pub fn is_loading(&self) -> bool {
        matches!(*self.state.read(), AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().session().is_some()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Drop in-memory state; persisted storage is left alone
    pub fn dispose(&self) {
        *self.state.write() = AuthState::Unauthenticated;
    }

    async fn run_login<F>(&self, method: &'static str, attempt: F) -> LoginOutcome
    where
        F: Future<Output = AuthResult<SignIn>> + Send + 'static,
    {
        let Ok(_gate) = self.transition.try_lock() else {
            tracing::debug!(method, "Login ignored, another transition is in flight");
            return LoginOutcome::failed(AuthError::LoginInProgress);
        };
        // A login racing ahead of init still sees the persisted session first
        self.restore();

        let sign_in = match self.call_backend(attempt).await {
            Ok(sign_in) => sign_in,
            Err(err) => {
                let err = normalize_backend_error(err);
                if err.is_fatal() {
                    self.end_session("fatal");
                }
                match err {
                    AuthError::PopupCancelled => tracing::info!(method, "Sign-in popup closed"),
                    _ => tracing::warn!(method, code = err.error_code(), error = %err, "Login failed"),
                }
                return LoginOutcome::failed(err);
            }
        };

        let route = landing_route_for(sign_in.user.role);
        if let Err(err) = self.store.save(&sign_in.token, &sign_in.user) {
            tracing::error!(error = %err, "Failed to persist session");
            self.end_session("persist-failed");
            return LoginOutcome::failed(err);
        }

        tracing::info!(
            method,
            backend = self.backend.backend_name(),
            user_id = %sign_in.user.id,
            role = %sign_in.user.role,
            "Login succeeded"
        );
        *self.state.write() = AuthState::Authenticated(sign_in.into());
        LoginOutcome::succeeded(route)
    }

    async fn call_backend<F>(&self, attempt: F) -> AuthResult<SignIn>
    where
        F: Future<Output = AuthResult<SignIn>> + Send + 'static,
    {
        // Spawned so a panicking backend surfaces as a join error. Only holds
        // when panics unwind; a `panic = "abort"` build terminates instead.
        let mut handle = tokio::spawn(attempt);
        match tokio::time::timeout(self.provider_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AuthError::provider_unavailable(format!(
                "identity backend failed: {}",
                join_err
            ))),
            Err(_) => {
                handle.abort();
                Err(AuthError::provider_unavailable("identity provider timed out"))
            }
        }
    }

    fn end_session(&self, reason: &'static str) {
        self.clear_store();
        let mut state = self.state.write();
        if let AuthState::Authenticated(session) = &*state {
            tracing::info!(reason, user_id = %session.user.id, "Session ended");
        }
        *state = AuthState::Unauthenticated;
    }

    fn clear_store(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "Failed to clear stored session");
        }
    }
}

/// Keep the kinds the login form knows how to present; anything else is an
/// unexpected backend failure.
fn normalize_backend_error(err: AuthError) -> AuthError {
    match err {
        AuthError::MalformedRequest { .. }
        | AuthError::InvalidCredentials
        | AuthError::ProviderUnavailable { .. }
        | AuthError::PopupCancelled
        | AuthError::UnknownRole { .. }
        | AuthError::LoginInProgress => err,
        other => AuthError::provider_unavailable(other.to_string()),
    }
}
