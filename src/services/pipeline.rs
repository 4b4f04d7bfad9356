use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncRead;
use utoipa::ToSchema;

use crate::config::ConvertConfig;
use crate::services::cache::{ConversionRecord, SessionCache};
use crate::services::converter::DocumentConverter;
use crate::services::ingest::{self, IngestError, IngestObserver};
use crate::services::reducer::strip_markdown;
use crate::utils::size::{human_mb, percent_smaller};
use crate::utils::validation::{extension_suffix, is_supported};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// New content, converter ran, record stored
    Converted,
    /// Byte-identical content already converted this session; converter
    /// not invoked
    Cached,
    /// Converter failed; record stored with empty markdown
    ConversionFailed,
    /// Upload refused (type, size cap, I/O); no record stored
    Rejected,
}

/// Per-file result of a batch conversion request
#[derive(Debug, Serialize, ToSchema)]
pub struct FileOutcome {
    pub filename: String,
    pub status: OutcomeStatus,
    /// Content hash; absent for rejected files
    pub hash: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
    /// First `preview_chars` characters of the markdown
    pub preview: Option<String>,
    pub original_bytes: Option<u64>,
    pub derived_bytes: Option<u64>,
    pub percent_smaller: Option<f64>,
}

impl FileOutcome {
    fn rejected(filename: &str, error: String) -> Self {
        Self {
            filename: filename.to_string(),
            status: OutcomeStatus::Rejected,
            hash: None,
            error: Some(error),
            warning: None,
            preview: None,
            original_bytes: None,
            derived_bytes: None,
            percent_smaller: None,
        }
    }
}

/// Runs uploads through ingest, dedup lookup, conversion and reduction.
///
/// Every failure is file-scoped: the caller gets an outcome per file and a
/// bad file never aborts the rest of its batch or touches records already
/// in the cache.
pub struct ConversionService {
    converter: Arc<dyn DocumentConverter>,
    config: ConvertConfig,
}

impl ConversionService {
    pub fn new(converter: Arc<dyn DocumentConverter>, config: ConvertConfig) -> Self {
        Self { converter, config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub async fn converter_healthy(&self) -> bool {
        self.converter.health_check().await
    }

    pub async fn process_file<R>(
        &self,
        cache: &SessionCache,
        original_name: &str,
        declared_size: Option<u64>,
        reader: R,
        export_txt: bool,
        observer: &dyn IngestObserver,
    ) -> FileOutcome
    where
        R: AsyncRead + Unpin,
    {
        // 1. Extension gate (richer variant only)
        if self.config.restrict_extensions && !is_supported(original_name) {
            tracing::info!("Skipping '{}': unsupported file type", original_name);
            return FileOutcome::rejected(original_name, "Unsupported file type".to_string());
        }

        // 2. Save + hash
        let suffix = extension_suffix(original_name);
        let ingested = match ingest::stream_to_temp(
            reader,
            &suffix,
            declared_size,
            &self.config,
            observer,
        )
        .await
        {
            Ok(ingested) => ingested,
            Err(e) => {
                match &e {
                    IngestError::SizeLimitExceeded { .. } => {
                        tracing::info!("Rejected '{}': {}", original_name, e)
                    }
                    IngestError::Io(_) => {
                        tracing::error!("Ingest failed for '{}': {}", original_name, e)
                    }
                }
                return FileOutcome::rejected(original_name, format!("Upload failed: {}", e));
            }
        };

        let size_mb = human_mb(ingested.size);
        let warning = (ingested.size > self.config.warn_threshold).then(|| {
            format!(
                "This file is {:.1} MB. Conversion may take longer.",
                size_mb
            )
        });

        // 3. Dedupe by content hash
        if let Some(record) = cache.get(&ingested.hash).await {
            tracing::info!(
                "Cache hit for '{}' ({}), reusing record for '{}'",
                original_name,
                &ingested.hash[..12],
                record.original_name
            );
            return self.outcome_from_record(
                original_name,
                &ingested.hash,
                OutcomeStatus::Cached,
                None,
                warning,
                &record,
            );
        }

        // 4. Convert (at most once per distinct content per session)
        let (markdown, conversion_error) = match self.converter.convert(ingested.path()).await {
            Ok(text) => (text.trim().to_string(), None),
            Err(e) => {
                tracing::warn!("Conversion failed for '{}': {}", original_name, e);
                (String::new(), Some(format!("Conversion failed: {}", e)))
            }
        };
        // Conversion is done with the temp file; remove it before the
        // derivation work.
        let (hash, original_bytes) = ingested.finalize();

        // 5. Derive plain text. The byte count is kept for the size
        // comparison even when the .txt export is off.
        let plain_text = if markdown.is_empty() {
            String::new()
        } else {
            strip_markdown(&markdown)
        };
        let derived_bytes = plain_text.len() as u64;

        let record = ConversionRecord {
            original_name: original_name.to_string(),
            markdown,
            plain_text: (export_txt && !plain_text.is_empty()).then_some(plain_text),
            created_at: Utc::now(),
            original_bytes,
            derived_bytes,
        };

        let status = if conversion_error.is_some() {
            OutcomeStatus::ConversionFailed
        } else {
            OutcomeStatus::Converted
        };

        let stored = cache.insert_if_absent(hash.clone(), record).await;
        tracing::info!(
            "Converted '{}': {} bytes in, {} bytes of text out ({})",
            original_name,
            stored.original_bytes,
            stored.derived_bytes,
            &hash[..12]
        );

        self.outcome_from_record(original_name, &hash, status, conversion_error, warning, &stored)
    }

    fn outcome_from_record(
        &self,
        filename: &str,
        hash: &str,
        status: OutcomeStatus,
        error: Option<String>,
        warning: Option<String>,
        record: &ConversionRecord,
    ) -> FileOutcome {
        let preview: String = record
            .markdown
            .chars()
            .take(self.config.preview_chars)
            .collect();
        FileOutcome {
            filename: filename.to_string(),
            status,
            hash: Some(hash.to_string()),
            error,
            warning,
            preview: Some(preview),
            original_bytes: Some(record.original_bytes),
            derived_bytes: Some(record.derived_bytes),
            percent_smaller: percent_smaller(record.original_bytes, Some(record.derived_bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::converter::{AlwaysFailingConverter, PassthroughConverter};
    use crate::services::ingest::NoopObserver;
    use anyhow::Result;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConverter {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DocumentConverter for CountingConverter {
        async fn convert(&self, _path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("# Converted\n\nSome **text**.".to_string())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn service(converter: Arc<dyn DocumentConverter>) -> ConversionService {
        ConversionService::new(converter, ConvertConfig::development())
    }

    #[tokio::test]
    async fn test_convert_then_cache_hit() {
        let converter = Arc::new(CountingConverter {
            calls: AtomicUsize::new(0),
        });
        let service = service(converter.clone());
        let cache = SessionCache::new();
        let data = b"unique document bytes";

        let first = service
            .process_file(&cache, "doc.txt", None, &data[..], false, &NoopObserver)
            .await;
        assert_eq!(first.status, OutcomeStatus::Converted);
        assert_eq!(first.original_bytes, Some(data.len() as u64));
        assert!(first.preview.unwrap().starts_with("# Converted"));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);

        // Same bytes again: no second converter invocation
        let second = service
            .process_file(&cache, "copy-of-doc.txt", None, &data[..], false, &NoopObserver)
            .await;
        assert_eq!(second.status, OutcomeStatus::Cached);
        assert_eq!(second.hash, first.hash);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_conversion_failure_still_creates_record() {
        let service = service(Arc::new(AlwaysFailingConverter));
        let cache = SessionCache::new();

        let outcome = service
            .process_file(&cache, "bad.pdf", None, &b"payload"[..], false, &NoopObserver)
            .await;
        assert_eq!(outcome.status, OutcomeStatus::ConversionFailed);
        assert!(outcome.error.unwrap().contains("Conversion failed"));

        let record = cache.get(outcome.hash.as_deref().unwrap()).await.unwrap();
        assert_eq!(record.markdown, "");
        assert_eq!(record.derived_bytes, 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let config = ConvertConfig {
            restrict_extensions: true,
            ..ConvertConfig::default()
        };
        let service = ConversionService::new(Arc::new(PassthroughConverter), config);
        let cache = SessionCache::new();

        let outcome = service
            .process_file(&cache, "tool.exe", None, &b"MZ"[..], false, &NoopObserver)
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert!(outcome.hash.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_declared_size_over_cap_rejected() {
        let service = service(Arc::new(PassthroughConverter));
        let cache = SessionCache::new();

        let outcome = service
            .process_file(
                &cache,
                "huge.txt",
                Some(250 * 1024 * 1024),
                &b"tiny"[..],
                false,
                &NoopObserver,
            )
            .await;
        assert_eq!(outcome.status, OutcomeStatus::Rejected);
        assert!(outcome.error.unwrap().contains("size cap"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_plain_text_export_decided_at_conversion_time() {
        let service = service(Arc::new(PassthroughConverter));
        let cache = SessionCache::new();
        let data = b"# Title\n\nsome *body* text";

        let first = service
            .process_file(&cache, "a.md", None, &data[..], true, &NoopObserver)
            .await;
        let record = cache.get(first.hash.as_deref().unwrap()).await.unwrap();
        assert!(record.plain_text.is_some());
        assert_eq!(record.derived_bytes, record.plain_text.unwrap().len() as u64);

        // Re-upload with the toggle off: cached record keeps its artifact
        let second = service
            .process_file(&cache, "a.md", None, &data[..], false, &NoopObserver)
            .await;
        assert_eq!(second.status, OutcomeStatus::Cached);
        let record = cache.get(second.hash.as_deref().unwrap()).await.unwrap();
        assert!(record.plain_text.is_some());
    }

    #[tokio::test]
    async fn test_no_export_keeps_derived_bytes() {
        let service = service(Arc::new(PassthroughConverter));
        let cache = SessionCache::new();

        let outcome = service
            .process_file(&cache, "b.md", None, &b"## plain **rich**"[..], false, &NoopObserver)
            .await;
        let record = cache.get(outcome.hash.as_deref().unwrap()).await.unwrap();
        assert!(record.plain_text.is_none());
        assert!(record.derived_bytes > 0);
        assert_eq!(outcome.derived_bytes, Some(record.derived_bytes));
    }
}
