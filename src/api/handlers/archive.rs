use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;

use super::session_id_from;
use crate::AppState;
use crate::api::error::AppError;
use crate::services::archive::bundle_records;
use crate::utils::naming::archive_name;

#[utoipa::path(
    get,
    path = "/archive",
    responses(
        (status = 200, description = "ZIP bundle of every record in the session"),
        (status = 404, description = "Session has no conversions")
    ),
    tag = "results"
)]
pub async fn download_archive(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let cache = session_id_from(&headers)
        .and_then(|id| state.sessions.get(&id))
        .ok_or_else(|| AppError::NotFound("No conversions in this session".to_string()))?;

    let records = cache.snapshot().await;
    if records.is_empty() {
        return Err(AppError::NotFound(
            "No conversions in this session".to_string(),
        ));
    }

    let bytes = bundle_records(&records)
        .map_err(|e| AppError::Internal(format!("Failed to build archive: {}", e)))?;

    tracing::info!(
        "Bundled {} record(s) into a {} byte archive",
        records.len(),
        bytes.len()
    );

    let response_headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive_name(Utc::now())),
        ),
    ];

    Ok((response_headers, Body::from(Bytes::from(bytes))).into_response())
}
