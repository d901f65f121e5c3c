//! Public catalog: listing with search and the activity detail.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{Activity, ActivitySearch, ActivitySummary};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginationParams};

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activities))
        .route("/:id", get(get_activity))
}

/// Browse the active catalog with optional text search, filters and ordering
#[utoipa::path(
    get,
    path = "/api/v1/actividades",
    tag = "Actividades",
    params(ActivitySearch, PaginationParams),
    responses(
        (status = 200, description = "Active activities", body = PaginatedSummaries),
        (status = 400, description = "Malformed query"),
        (status = 422, description = "Inconsistent filter ranges")
    )
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(search): Query<ActivitySearch>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ActivitySummary>>> {
    let listed = state.services.activities().list(search, page).await?;
    Ok(Json(listed))
}

/// Activity detail. Each successful read counts as a view.
#[utoipa::path(
    get,
    path = "/api/v1/actividades/{id}",
    tag = "Actividades",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Active activity", body = Activity),
        (status = 404, description = "Unknown or not active")
    )
)]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Activity>> {
    let activity = state.services.activities().get_detail(id).await?;
    Ok(Json(activity))
}
