//! OpenAPI document served by Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    activity_handler, admin_handler, etl_handler, favorite_handler, profile_handler,
    recommendation_handler,
};
use crate::domain::{
    Activity, ActivityLevel, ActivityStatus, ActivitySummary, ActivityUpdate, Category,
    EtlExecution, EtlStatus, Explanation, Favorite, Locality, NewActivity, ReasonKind,
    Recommendation, RecommendationList, SortField, SortOrder,
};
use crate::etl::{EtlReport, IssueKind, RecordIssue, SourceFormat};
use crate::services::{
    FavoriteEntry, ImportResult, ImportRowError, PopularityReport, ProfileView,
    UpdateProfileRequest,
};
use crate::types::{
    PaginatedActivities, PaginatedExecutions, PaginatedFavorites, PaginatedSummaries,
    PaginationMeta,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Triqueta API",
        version = "0.1.0",
        description = "Cultural, sports and recreation activities in Bogotá: catalog, ETL ingestion and recommendations"
    ),
    servers((url = "http://localhost:3000", description = "Local development server")),
    paths(
        activity_handler::list_activities,
        activity_handler::get_activity,
        recommendation_handler::recommend,
        favorite_handler::add_favorite,
        favorite_handler::list_favorites,
        favorite_handler::remove_favorite,
        profile_handler::get_profile,
        profile_handler::update_profile,
        admin_handler::create_activity,
        admin_handler::update_activity,
        admin_handler::list_pending,
        admin_handler::approve_activity,
        admin_handler::reject_activity,
        admin_handler::delete_activity,
        admin_handler::import_activities,
        admin_handler::recalculate_popularity,
        etl_handler::upload,
        etl_handler::list_executions,
        etl_handler::get_execution,
        etl_handler::cancel_execution,
    ),
    components(
        schemas(
            Activity,
            NewActivity,
            ActivityUpdate,
            ActivitySummary,
            SortField,
            SortOrder,
            Category,
            Locality,
            ActivityLevel,
            ActivityStatus,
            Favorite,
            FavoriteEntry,
            favorite_handler::AddFavoriteRequest,
            ProfileView,
            UpdateProfileRequest,
            Recommendation,
            RecommendationList,
            Explanation,
            ReasonKind,
            EtlExecution,
            EtlStatus,
            EtlReport,
            RecordIssue,
            IssueKind,
            SourceFormat,
            ImportResult,
            ImportRowError,
            PopularityReport,
            PaginationMeta,
            PaginatedActivities,
            PaginatedExecutions,
            PaginatedFavorites,
            PaginatedSummaries,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Actividades", description = "Public catalog search and activity detail"),
        (name = "Recomendaciones", description = "Personalized and anonymous recommendations"),
        (name = "Favoritos", description = "Saved activities"),
        (name = "Perfil", description = "Preference profile"),
        (name = "Administracion", description = "Catalog moderation and import"),
        (name = "ETL", description = "Batch ingestion and execution history")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("HS256 token with `sub` (user id) and `role` claims"))
                        .build(),
                ),
            );
        }
    }
}
