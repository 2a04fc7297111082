pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::ServerConfig;
use crate::services::formatter::DocumentFormatter;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_document,
        api::handlers::upload::get_validation_rules,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadForm,
            api::handlers::health::HealthResponse,
            models::ErrorResponse,
            models::DocumentMime,
            utils::validation::ValidationRules,
        )
    ),
    tags(
        (name = "documents", description = "Document formatting endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub formatter: Arc<dyn DocumentFormatter>,
    pub config: ServerConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/validation-rules",
            get(api::handlers::upload::get_validation_rules),
        )
        .route("/api/upload", post(api::handlers::upload::upload_document))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .with_state(state)
}
