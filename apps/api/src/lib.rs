//! HTTP boundary for the acadash auth core

pub mod config;
pub mod error;
pub mod logging;
pub mod request_id;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{middleware, Router};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application router with tracing, CORS and request IDs
pub fn app(state: AppState) -> Router {
    routes::router(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::propagate_request_id))
        .layer(CorsLayer::permissive())
}
