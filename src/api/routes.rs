//! Router assembly.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    activity_routes, admin_routes, etl_routes, favorite_routes, profile_routes,
    recommendation_routes,
};
use super::middleware::{admin_middleware, auth_middleware, optional_auth_middleware};
use super::openapi::ApiDoc;
use super::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    let user = Router::new()
        .nest("/favoritos", favorite_routes())
        .nest("/perfil", profile_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // route_layer order: auth runs before the admin check
    let admin = admin_routes()
        .nest("/etl", etl_routes())
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/actividades", activity_routes())
        .nest(
            "/recomendaciones",
            recommendation_routes().route_layer(middleware::from_fn_with_state(
                state,
                optional_auth_middleware,
            )),
        )
        .merge(user)
        .nest("/admin", admin)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    cache: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: ToString>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy",
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

/// Database and cache connectivity. 503 when either is down.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => ServiceStatus::from_result(db.ping().await),
        None => ServiceStatus {
            status: "skipped",
            error: None,
        },
    };
    let cache = ServiceStatus::from_result(state.cache.ping().await);

    let degraded = database.is_unhealthy() || cache.is_unhealthy();
    if degraded {
        tracing::warn!(
            database = ?database.error,
            cache = ?cache.error,
            "Health check degraded"
        );
    }
    let response = HealthResponse {
        status: if degraded { "degraded" } else { "healthy" },
        services: ServiceHealth { database, cache },
    };

    let status_code = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status_code, Json(response))
}
