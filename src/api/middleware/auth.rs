//! Bearer token middleware.
//!
//! `auth_middleware` requires a valid token, `optional_auth_middleware`
//! accepts anonymous requests, and `admin_middleware` runs after either to
//! require the admin role. The caller lands in request extensions as
//! `AuthUser`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::errors::AppError;
use crate::services::AuthUser;

/// `Ok(None)` when no Authorization header is present.
fn caller(state: &AppState, request: &Request) -> Result<Option<AuthUser>, AppError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.services.auth().verify_token(token)?;
    Ok(Some(AuthUser::from(claims)))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = caller(&state, &request)?.ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// A present but invalid token is still rejected.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(user) = caller(&state, &request)? {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?
        .require_admin()?;
    Ok(next.run(request).await)
}
