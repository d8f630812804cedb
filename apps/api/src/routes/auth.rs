//! Login and session endpoints

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use acadash_auth::middleware::RoleGuard;
use acadash_auth::{landing_route_for, nav_items, AuthError, NavItem, Role, User};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Role picked in the login form; the stored role always wins
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub role: Role,
    pub landing_route: &'static str,
    pub items: &'static [NavItem],
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub path: String,
    pub allowed: bool,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    if let Some(hint) = request.role.as_deref() {
        tracing::debug!(role_hint = hint, "Ignoring role selected in the login form");
    }
    tracing::info!(email = %request.email, "Login attempt");

    let backend = state.backend.clone();
    let attempt = tokio::spawn(async move {
        backend.sign_in(&request.email, &request.password).await
    });

    let sign_in = match tokio::time::timeout(state.provider_timeout, attempt).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => return Err(ApiError::internal(join_err.to_string())),
        Err(_) => return Err(ApiError::internal("login timed out")),
    };

    match sign_in {
        Ok(sign_in) => {
            tracing::info!(user_id = %sign_in.user.id, role = %sign_in.user.role, "Login succeeded");
            Ok(Json(LoginResponse {
                user: sign_in.user,
                token: sign_in.token,
            }))
        }
        Err(err) => {
            tracing::warn!(code = err.error_code(), "Login failed");
            Err(login_error(err))
        }
    }
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<MeResponse>> {
    let user = authenticate(&state, &headers)?;
    Ok(Json(MeResponse { user }))
}

pub async fn navigation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<NavigationResponse>> {
    let user = authenticate(&state, &headers)?;
    Ok(Json(NavigationResponse {
        role: user.role,
        landing_route: landing_route_for(user.role),
        items: nav_items(user.role),
    }))
}

/// Layout gate: may the caller open the given dashboard path
pub async fn access(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AccessQuery>, QueryRejection>,
) -> ApiResult<Json<AccessResponse>> {
    let user = authenticate(&state, &headers)?;
    let Query(query) = query.map_err(|_| ApiError::bad_request("path query parameter is required"))?;

    RoleGuard::new().check(&user, &query.path)?;
    Ok(Json(AccessResponse {
        path: query.path,
        allowed: true,
    }))
}

/// The login endpoint answers 400, 401 or 500 on failure
fn login_error(err: AuthError) -> ApiError {
    match err {
        AuthError::MalformedRequest { .. } | AuthError::InvalidCredentials => err.into(),
        other => ApiError::internal(other.to_string()),
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let header = headers
        .get(state.bearer.header_name())
        .and_then(|value| value.to_str().ok());
    Ok(state.bearer.authenticate(header)?)
}
