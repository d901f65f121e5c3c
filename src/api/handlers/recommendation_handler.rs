//! Recommendations for anonymous or authenticated callers.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Extension, Router,
};

use crate::api::AppState;
use crate::domain::{RecommendationList, RecommendationQuery};
use crate::errors::AppResult;
use crate::services::AuthUser;

pub fn recommendation_routes() -> Router<AppState> {
    Router::new().route("/", get(recommend))
}

/// Ranked activities. Anonymous callers get popularity order only.
#[utoipa::path(
    get,
    path = "/api/v1/recomendaciones",
    tag = "Recomendaciones",
    params(RecommendationQuery),
    responses(
        (status = 200, description = "Ranked recommendations", body = RecommendationList),
        (status = 422, description = "Limit out of range"),
        (status = 401, description = "Invalid bearer token")
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn recommend(
    State(state): State<AppState>,
    caller: Option<Extension<AuthUser>>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationList>> {
    let user_id = caller.map(|Extension(user)| user.user_id);
    let list = state
        .services
        .recommendations()
        .recommend(user_id, query)
        .await?;
    Ok(Json(list))
}
