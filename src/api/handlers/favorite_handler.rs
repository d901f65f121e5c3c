//! Favorites of the authenticated user.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::Favorite;
use crate::errors::AppResult;
use crate::services::{AuthUser, FavoriteEntry};
use crate::types::{Created, NoContent, Paginated, PaginationParams};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub actividad_id: Uuid,
}

pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/:actividad_id", delete(remove_favorite))
}

#[utoipa::path(
    post,
    path = "/api/v1/favoritos",
    tag = "Favoritos",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Saved", body = Favorite),
        (status = 404, description = "Unknown activity"),
        (status = 409, description = "Already saved or activity not active")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddFavoriteRequest>,
) -> AppResult<Created<Favorite>> {
    let favorite = state
        .services
        .favorites()
        .add(user.user_id, payload.actividad_id)
        .await?;
    Ok(Created(favorite))
}

#[utoipa::path(
    get,
    path = "/api/v1/favoritos",
    tag = "Favoritos",
    params(PaginationParams),
    responses(
        (status = 200, description = "Saved activities, newest first", body = PaginatedFavorites)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<FavoriteEntry>>> {
    let favorites = state.services.favorites().list(user.user_id, page).await?;
    Ok(Json(favorites))
}

#[utoipa::path(
    delete,
    path = "/api/v1/favoritos/{actividad_id}",
    tag = "Favoritos",
    params(("actividad_id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not saved by the caller")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(actividad_id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .services
        .favorites()
        .remove(user.user_id, actividad_id)
        .await?;
    Ok(NoContent)
}
