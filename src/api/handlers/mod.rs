pub mod archive;
pub mod convert;
pub mod health;
pub mod results;

use axum::http::HeaderMap;

/// Header carrying the opaque session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Session id from the request headers, when present and plausible
pub(crate) fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map(str::to_string)
}
