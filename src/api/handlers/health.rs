use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub converter: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let converter_status = if state.pipeline.converter_healthy().await {
        "available"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        converter: converter_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
