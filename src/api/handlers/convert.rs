use axum::{
    Json,
    extract::{Multipart, State},
    http::HeaderMap,
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use uuid::Uuid;

use super::session_id_from;
use crate::AppState;
use crate::api::error::AppError;
use crate::services::ingest::IngestObserver;
use crate::services::pipeline::FileOutcome;

#[derive(Serialize, ToSchema)]
pub struct ConvertResponse {
    /// Session owning the records; pass it back as `x-session-id`
    pub session_id: String,
    pub results: Vec<FileOutcome>,
}

/// Forwards save-while-hash progress to the request log
struct ProgressLogger<'a> {
    filename: &'a str,
}

impl IngestObserver for ProgressLogger<'_> {
    fn on_chunk(&self, bytes_so_far: u64, declared_size: Option<u64>) {
        match declared_size {
            Some(total) if total > 0 => tracing::debug!(
                "Saving '{}': {}/{} bytes",
                self.filename,
                bytes_so_far,
                total
            ),
            _ => tracing::debug!("Saving '{}': {} bytes", self.filename, bytes_so_far),
        }
    }
}

#[utoipa::path(
    post,
    path = "/convert",
    request_body(content = Multipart, description = "One or more `file` parts. A `declared_size` text part applies to the next file; a `plain_text` text part (`true`/`1`) enables the .txt export for files after it."),
    responses(
        (status = 200, description = "Per-file conversion outcomes", body = ConvertResponse),
        (status = 400, description = "Malformed request or no file part"),
        (status = 413, description = "Request body over the configured limit")
    ),
    tag = "convert"
)]
pub async fn convert_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    // Declared request size over the limit fails before any body is read
    let content_length = headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if content_length.is_some_and(|len| len > state.config.max_request_size) {
        return Err(AppError::PayloadTooLarge(
            "Request body exceeds the maximum allowed limit".to_string(),
        ));
    }

    let session_id = session_id_from(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());
    let cache = state.sessions.get_or_create(&session_id);

    let mut export_txt = false;
    let mut declared_size: Option<u64> = None;
    let mut results: Vec<FileOutcome> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let err_msg = e.to_string();
        if err_msg.contains("length limit exceeded") {
            AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
        } else {
            AppError::BadRequest(err_msg)
        }
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let original_filename = field.file_name().unwrap_or("unnamed").to_string();

            let body_with_io_error = field.map_err(std::io::Error::other);
            let reader = StreamReader::new(body_with_io_error);
            let observer = ProgressLogger {
                filename: &original_filename,
            };

            // File-scoped failures land in the outcome; the batch goes on
            let outcome = state
                .pipeline
                .process_file(
                    &cache,
                    &original_filename,
                    declared_size.take(),
                    reader,
                    export_txt,
                    &observer,
                )
                .await;
            results.push(outcome);
        } else if name == "declared_size" {
            let text = field.text().await.unwrap_or_default();
            declared_size = text.parse().ok();
        } else if name == "plain_text" {
            let text = field.text().await.unwrap_or_default();
            export_txt = matches!(text.to_lowercase().as_str(), "true" | "1" | "on" | "yes");
        }
    }

    if results.is_empty() {
        return Err(AppError::BadRequest("No file provided".to_string()));
    }

    Ok(Json(ConvertResponse {
        session_id,
        results,
    }))
}
