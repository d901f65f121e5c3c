//! Catalog administration: manual create, editing, moderation, bulk import and
//! popularity recalculation. Mounted behind the admin guard.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{Activity, ActivityUpdate, NewActivity};
use crate::errors::AppResult;
use crate::etl::SourceFormat;
use crate::services::{ImportResult, PopularityReport};
use crate::types::{Created, NoContent, Paginated, PaginationParams};

/// Format of a raw request body
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormatQuery {
    /// `csv` (default) or `json`
    #[serde(default)]
    pub format: SourceFormat,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/actividades", post(create_activity))
        .route("/actividades/pendientes", get(list_pending))
        .route("/actividades/:id", put(update_activity).delete(delete_activity))
        .route("/actividades/:id/aprobar", post(approve_activity))
        .route("/actividades/:id/rechazar", post(reject_activity))
        .route("/import", post(import_activities))
        .route("/popularidad/recalcular", post(recalculate_popularity))
}

/// Create an activity directly in the active catalog
#[utoipa::path(
    post,
    path = "/api/v1/admin/actividades",
    tag = "Administracion",
    request_body = NewActivity,
    responses(
        (status = 201, description = "Created", body = Activity),
        (status = 409, description = "Same title, start and address already stored"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_activity(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewActivity>,
) -> AppResult<Created<Activity>> {
    let activity = state.services.activities().create(payload).await?;
    Ok(Created(activity))
}

/// Edit an activity in any status. Omitted fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/v1/admin/actividades/{id}",
    tag = "Administracion",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body = ActivityUpdate,
    responses(
        (status = 200, description = "Updated", body = Activity),
        (status = 404, description = "Unknown activity"),
        (status = 409, description = "Same title, start and address already stored"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ActivityUpdate>,
) -> AppResult<Json<Activity>> {
    let activity = state.services.activities().update(id, payload).await?;
    Ok(Json(activity))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/actividades/pendientes",
    tag = "Administracion",
    params(PaginationParams),
    responses((status = 200, description = "Activities awaiting moderation", body = PaginatedActivities)),
    security(("bearer_auth" = []))
)]
pub async fn list_pending(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Activity>>> {
    let pending = state.services.activities().list_pending(page).await?;
    Ok(Json(pending))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/actividades/{id}/aprobar",
    tag = "Administracion",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Now active", body = Activity),
        (status = 404, description = "Unknown activity"),
        (status = 409, description = "Not pending validation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Activity>> {
    let activity = state.services.activities().approve(id).await?;
    Ok(Json(activity))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/actividades/{id}/rechazar",
    tag = "Administracion",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Rejected", body = Activity),
        (status = 404, description = "Unknown activity"),
        (status = 409, description = "Not pending validation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Activity>> {
    let activity = state.services.activities().reject(id).await?;
    Ok(Json(activity))
}

/// Soft delete: the activity becomes inactive
#[utoipa::path(
    delete,
    path = "/api/v1/admin/actividades/{id}",
    tag = "Administracion",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 204, description = "Deactivated"),
        (status = 404, description = "Unknown activity"),
        (status = 409, description = "Not active")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state.services.activities().soft_delete(id).await?;
    Ok(NoContent)
}

/// Row-by-row import. Imported rows wait for moderation.
#[utoipa::path(
    post,
    path = "/api/v1/admin/import",
    tag = "Administracion",
    params(FormatQuery),
    request_body(content = String, description = "CSV or JSON array", content_type = "text/plain"),
    responses(
        (status = 200, description = "Per-row outcome", body = ImportResult),
        (status = 400, description = "Payload could not be read")
    ),
    security(("bearer_auth" = []))
)]
pub async fn import_activities(
    State(state): State<AppState>,
    Query(query): Query<FormatQuery>,
    body: String,
) -> AppResult<Json<ImportResult>> {
    let result = state
        .services
        .activities()
        .import(query.format, body)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/popularidad/recalcular",
    tag = "Administracion",
    responses((status = 200, description = "Scores rewritten", body = PopularityReport)),
    security(("bearer_auth" = []))
)]
pub async fn recalculate_popularity(
    State(state): State<AppState>,
) -> AppResult<Json<PopularityReport>> {
    let report = state.services.popularity().recalculate().await?;
    Ok(Json(report))
}
