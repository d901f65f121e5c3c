//! ETL uploads and execution history. Mounted behind the admin guard.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::AppState;
use crate::config::DEFAULT_ETL_SOURCE;
use crate::domain::EtlExecution;
use crate::errors::AppResult;
use crate::etl::SourceFormat;
use crate::services::{AuthUser, EtlUpload};
use crate::types::{Accepted, Paginated, PaginationParams};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// `csv` (default) or `json`
    #[serde(default)]
    pub format: SourceFormat,
    /// Original file name, kept in the execution config
    pub filename: Option<String>,
    /// Source label stamped on loaded activities
    pub source: Option<String>,
}

pub fn etl_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/executions", get(list_executions))
        .route("/executions/:id", get(get_execution))
        .route("/executions/:id/cancel", post(cancel_execution))
}

/// Queue a batch. The execution starts pending and is processed by the worker.
#[utoipa::path(
    post,
    path = "/api/v1/admin/etl/upload",
    tag = "ETL",
    params(UploadQuery),
    request_body(content = String, description = "CSV or JSON array", content_type = "text/plain"),
    responses(
        (status = 202, description = "Execution queued", body = EtlExecution),
        (status = 400, description = "Empty payload"),
        (status = 500, description = "Queue unavailable; the execution is marked failed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> AppResult<Accepted<EtlExecution>> {
    let execution = state
        .services
        .etl()
        .trigger(EtlUpload {
            admin_id: admin.user_id,
            format: query.format,
            filename: query.filename,
            source: query.source.unwrap_or_else(|| DEFAULT_ETL_SOURCE.to_string()),
            payload: body,
        })
        .await?;
    Ok(Accepted(execution))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/etl/executions",
    tag = "ETL",
    params(PaginationParams),
    responses((status = 200, description = "Executions, newest first", body = PaginatedExecutions)),
    security(("bearer_auth" = []))
)]
pub async fn list_executions(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<EtlExecution>>> {
    let executions = state.services.etl().list(page).await?;
    Ok(Json(executions))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/etl/executions/{id}",
    tag = "ETL",
    params(("id" = Uuid, Path, description = "Execution ID")),
    responses(
        (status = 200, description = "Execution with its report", body = EtlExecution),
        (status = 404, description = "Unknown execution")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EtlExecution>> {
    let execution = state.services.etl().get(id).await?;
    Ok(Json(execution))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/etl/executions/{id}/cancel",
    tag = "ETL",
    params(("id" = Uuid, Path, description = "Execution ID")),
    responses(
        (status = 200, description = "Cancelled", body = EtlExecution),
        (status = 404, description = "Unknown execution"),
        (status = 409, description = "Already started or finished")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_execution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EtlExecution>> {
    let execution = state.services.etl().cancel(id).await?;
    Ok(Json(execution))
}
