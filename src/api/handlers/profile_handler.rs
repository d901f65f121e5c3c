//! Preference profile of the authenticated user.

use axum::{extract::State, response::Json, routing::get, Extension, Router};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{AuthUser, ProfileView, UpdateProfileRequest};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/perfil",
    tag = "Perfil",
    responses((status = 200, description = "Caller profile", body = ProfileView)),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<ProfileView>> {
    let profile = state.services.profiles().get(user.user_id).await?;
    Ok(Json(profile))
}

/// Replace the caller's preferences
#[utoipa::path(
    put,
    path = "/api/v1/perfil",
    tag = "Perfil",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileView),
        (status = 422, description = "Unknown locality or level, or too many tags")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<ProfileView>> {
    let profile = state
        .services
        .profiles()
        .update(user.user_id, payload)
        .await?;
    Ok(Json(profile))
}
