mod auth;
mod health;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .nest("/api/auth", auth_router())
        .with_state(state)
}

fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/navigation", get(auth::navigation))
        .route("/access", get(auth::access))
}
