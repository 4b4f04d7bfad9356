pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::config::ConvertConfig;
use crate::services::cache::SessionStore;
use crate::services::pipeline::ConversionService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::convert::convert_documents,
        api::handlers::results::list_results,
        api::handlers::results::get_result,
        api::handlers::results::download_markdown,
        api::handlers::results::download_text,
        api::handlers::archive::download_archive,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::convert::ConvertResponse,
            api::handlers::results::RecordSummary,
            api::handlers::results::RecordDetail,
            api::handlers::results::SizeComparison,
            services::pipeline::FileOutcome,
            services::pipeline::OutcomeStatus,
        )
    ),
    tags(
        (name = "convert", description = "Document upload and conversion"),
        (name = "results", description = "Session results, downloads, and bundling"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub pipeline: Arc<ConversionService>,
    pub config: ConvertConfig,
}

pub fn create_app(state: AppState) -> Router {
    let max_request_size = state.config.max_request_size;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/convert", post(api::handlers::convert::convert_documents))
        .route("/results", get(api::handlers::results::list_results))
        .route("/results/:hash", get(api::handlers::results::get_result))
        .route(
            "/results/:hash/markdown",
            get(api::handlers::results::download_markdown),
        )
        .route(
            "/results/:hash/text",
            get(api::handlers::results::download_text),
        )
        .route("/archive", get(api::handlers::archive::download_archive))
        .layer(DefaultBodyLimit::max(max_request_size))
        .with_state(state)
}
