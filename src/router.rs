use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router, middleware};
use chrono::Utc;
use serde_json::{Value, json};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::modules::auth::router::init_auth_router;
use crate::modules::clients::router::init_clients_router;
use crate::modules::departments::router::init_departments_router;
use crate::modules::employees::router::init_employees_router;
use crate::modules::financial::router::init_financial_router;
use crate::modules::notifications::router::init_notifications_router;
use crate::modules::tasks::router::init_tasks_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

async fn health(State(state): State<AppState>) -> Json<Value> {
    let uptime_seconds = (Utc::now() - state.started_at).num_seconds();
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "uptime_seconds": uptime_seconds,
    }))
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                // Stricter per-IP limit on credential endpoints, the general
                // limit on everything under /api.
                .nest(
                    "/auth",
                    init_auth_router().layer(GovernorLayer::new(
                        state.rate_limit_config.auth_governor_config(),
                    )),
                )
                .nest("/users", init_users_router())
                .nest("/employees", init_employees_router())
                .nest("/departments", init_departments_router())
                .nest("/clients", init_clients_router())
                .nest("/tasks", init_tasks_router())
                .nest("/financial", init_financial_router(state.clone()))
                .nest("/notifications", init_notifications_router())
                .layer(GovernorLayer::new(
                    state.rate_limit_config.general_governor_config(),
                )),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware))
}
