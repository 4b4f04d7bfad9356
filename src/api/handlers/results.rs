use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::session_id_from;
use crate::AppState;
use crate::api::error::AppError;
use crate::services::cache::{ConversionRecord, SessionCache};
use crate::utils::naming::build_output_name;
use crate::utils::size::{human_mb, percent_smaller};

#[derive(Serialize, ToSchema)]
pub struct RecordSummary {
    pub hash: String,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
    pub original_bytes: u64,
    pub derived_bytes: u64,
    pub percent_smaller: Option<f64>,
    pub has_plain_text: bool,
}

#[derive(Serialize, ToSchema)]
pub struct SizeComparison {
    pub original_bytes: u64,
    pub derived_bytes: u64,
    pub original_mb: f64,
    pub derived_mb: f64,
    /// Negative when the derived text is larger than the original
    pub percent_smaller: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct RecordDetail {
    pub hash: String,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
    pub markdown: String,
    pub has_plain_text: bool,
    pub size: SizeComparison,
}

impl RecordDetail {
    fn from_record(hash: &str, record: &ConversionRecord) -> Self {
        Self {
            hash: hash.to_string(),
            original_name: record.original_name.clone(),
            created_at: record.created_at,
            markdown: record.markdown.clone(),
            has_plain_text: record.plain_text.is_some(),
            size: SizeComparison {
                original_bytes: record.original_bytes,
                derived_bytes: record.derived_bytes,
                original_mb: human_mb(record.original_bytes),
                derived_mb: human_mb(record.derived_bytes),
                percent_smaller: percent_smaller(
                    record.original_bytes,
                    Some(record.derived_bytes),
                ),
            },
        }
    }
}

fn session_cache(state: &AppState, headers: &HeaderMap) -> Option<Arc<SessionCache>> {
    session_id_from(headers).and_then(|id| state.sessions.get(&id))
}

async fn find_record(
    state: &AppState,
    headers: &HeaderMap,
    hash: &str,
) -> Result<ConversionRecord, AppError> {
    let cache = session_cache(state, headers)
        .ok_or_else(|| AppError::NotFound("No conversions in this session".to_string()))?;
    cache
        .get(hash)
        .await
        .ok_or_else(|| AppError::NotFound("Result not found".to_string()))
}

#[utoipa::path(
    get,
    path = "/results",
    responses(
        (status = 200, description = "Summaries of this session's conversions", body = Vec<RecordSummary>)
    ),
    tag = "results"
)]
pub async fn list_results(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Vec<RecordSummary>> {
    let Some(cache) = session_cache(&state, &headers) else {
        return Json(Vec::new());
    };

    let summaries = cache
        .snapshot()
        .await
        .into_iter()
        .map(|(hash, record)| RecordSummary {
            hash,
            original_name: record.original_name,
            created_at: record.created_at,
            original_bytes: record.original_bytes,
            derived_bytes: record.derived_bytes,
            percent_smaller: percent_smaller(record.original_bytes, Some(record.derived_bytes)),
            has_plain_text: record.plain_text.is_some(),
        })
        .collect();

    Json(summaries)
}

#[utoipa::path(
    get,
    path = "/results/{hash}",
    params(
        ("hash" = String, Path, description = "Content hash of the record")
    ),
    responses(
        (status = 200, description = "Full record with size comparison", body = RecordDetail),
        (status = 404, description = "Unknown session or hash")
    ),
    tag = "results"
)]
pub async fn get_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> Result<Json<RecordDetail>, AppError> {
    let record = find_record(&state, &headers, &hash).await?;
    Ok(Json(RecordDetail::from_record(&hash, &record)))
}

#[utoipa::path(
    get,
    path = "/results/{hash}/markdown",
    params(
        ("hash" = String, Path, description = "Content hash of the record")
    ),
    responses(
        (status = 200, description = "Markdown artifact download"),
        (status = 404, description = "Unknown session or hash")
    ),
    tag = "results"
)]
pub async fn download_markdown(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    let record = find_record(&state, &headers, &hash).await?;
    let filename = build_output_name(&record.original_name, record.created_at, ".md");

    let response_headers = [
        (
            header::CONTENT_TYPE,
            "text/markdown; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((response_headers, Body::from(record.markdown)).into_response())
}

#[utoipa::path(
    get,
    path = "/results/{hash}/text",
    params(
        ("hash" = String, Path, description = "Content hash of the record")
    ),
    responses(
        (status = 200, description = "Plain-text artifact download"),
        (status = 404, description = "Unknown session or hash, or no .txt artifact for this record")
    ),
    tag = "results"
)]
pub async fn download_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    let record = find_record(&state, &headers, &hash).await?;
    let plain_text = record.plain_text.ok_or_else(|| {
        AppError::NotFound("No plain-text artifact for this record".to_string())
    })?;
    let filename = build_output_name(&record.original_name, record.created_at, ".txt");

    let response_headers = [
        (
            header::CONTENT_TYPE,
            mime::TEXT_PLAIN_UTF_8.to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((response_headers, Body::from(plain_text)).into_response())
}
