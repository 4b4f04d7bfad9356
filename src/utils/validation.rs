use std::path::Path;

/// Fallback token used when sanitization leaves nothing of a filename
pub const FALLBACK_NAME: &str = "file";

/// Allowed upload extensions: documents, web/text, images (OCR-capable
/// converters), audio (transcription-capable converters), archives.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // Office & docs
    "pdf", "docx", "doc", "pptx", "ppt", "xlsx", "xls", "rtf",
    // Web & text
    "html", "htm", "md", "txt", "csv", "tsv",
    // Images
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp",
    // Audio
    "mp3", "wav", "m4a", "ogg", "flac",
    // Archives
    "zip",
];

/// Checks whether a filename carries an allowed extension
pub fn is_supported(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

/// Extension of a filename including the leading dot, lowercased;
/// empty string when there is none. Used as the temp-file suffix so the
/// converter can route on it.
pub fn extension_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Normalizes an untrusted filename into a safe output-name fragment.
///
/// Trims whitespace, turns spaces into underscores, and drops every
/// character outside `[A-Za-z0-9._-]`. Total function: an input that
/// sanitizes to nothing yields [`FALLBACK_NAME`].
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    if sanitized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        sanitized
    }
}

/// Sanitized stem of a filename (everything before the final extension),
/// falling back to `converted` for extension-only names.
pub fn sanitized_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if stem.is_empty() {
        "converted".to_string()
    } else {
        sanitize_filename(stem)
    }
}
