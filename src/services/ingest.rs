use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::config::ConvertConfig;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file exceeds the hard size cap of {limit_mb} MB")]
    SizeLimitExceeded { limit_mb: u64 },

    #[error("I/O failure while saving upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives progress events from the save-while-hash loop.
///
/// The loop itself is side-effect free apart from the temp file; anything
/// user-facing (progress bars, log lines) hangs off this trait. The default
/// implementations are no-ops so callers only override what they need.
pub trait IngestObserver: Send + Sync {
    /// Called after each chunk is written and hashed.
    fn on_chunk(&self, bytes_so_far: u64, declared_size: Option<u64>) {
        let _ = (bytes_so_far, declared_size);
    }
}

/// Observer for callers that don't track progress
pub struct NoopObserver;

impl IngestObserver for NoopObserver {}

/// A fully ingested upload. The temporary file is deleted when this value
/// is dropped, on success and failure paths alike.
#[derive(Debug)]
pub struct IngestedUpload {
    temp: NamedTempFile,
    /// Lowercase hex SHA-256 over the exact streamed bytes
    pub hash: String,
    /// Exact number of bytes streamed, independent of any declared size
    pub size: u64,
}

impl IngestedUpload {
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Consume the upload, deleting the temporary file now and keeping the
    /// hash and exact byte count.
    pub fn finalize(self) -> (String, u64) {
        (self.hash, self.size)
    }
}

/// Streams an upload to a temporary file in fixed-size chunks while
/// incrementally hashing and counting bytes.
///
/// A declared size above the hard cap fails before anything is read or
/// written. The running count is checked after every chunk; crossing the
/// cap aborts and removes the partial file. `suffix` becomes the temp
/// file's extension so the converter can route on it.
pub async fn stream_to_temp<R>(
    reader: R,
    suffix: &str,
    declared_size: Option<u64>,
    config: &ConvertConfig,
    observer: &dyn IngestObserver,
) -> Result<IngestedUpload, IngestError>
where
    R: AsyncRead + Unpin,
{
    stream_to_temp_in(&std::env::temp_dir(), reader, suffix, declared_size, config, observer).await
}

/// Same as [`stream_to_temp`] with an explicit parent directory
pub async fn stream_to_temp_in<R>(
    dir: &Path,
    mut reader: R,
    suffix: &str,
    declared_size: Option<u64>,
    config: &ConvertConfig,
    observer: &dyn IngestObserver,
) -> Result<IngestedUpload, IngestError>
where
    R: AsyncRead + Unpin,
{
    if declared_size.is_some_and(|size| size > config.max_file_size) {
        return Err(IngestError::SizeLimitExceeded {
            limit_mb: config.max_file_size / 1024 / 1024,
        });
    }

    let temp = tempfile::Builder::new()
        .prefix("docs2md-")
        .suffix(suffix)
        .tempfile_in(dir)?;
    let mut file = tokio::fs::File::from_std(temp.reopen()?);

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; config.chunk_size];
    let mut bytes_written: u64 = 0;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n]).await?;
        hasher.update(&buffer[..n]);
        bytes_written += n as u64;
        observer.on_chunk(bytes_written, declared_size);

        if bytes_written > config.max_file_size {
            // `temp` drops here and removes the partial file
            return Err(IngestError::SizeLimitExceeded {
                limit_mb: config.max_file_size / 1024 / 1024,
            });
        }
    }

    file.flush().await?;
    drop(file);

    Ok(IngestedUpload {
        temp,
        hash: hex::encode(hasher.finalize()),
        size: bytes_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    // SHA-256 for "hello world"
    const HELLO_HASH: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn config_with(chunk_size: usize, max_file_size: u64) -> ConvertConfig {
        ConvertConfig {
            chunk_size,
            max_file_size,
            ..ConvertConfig::default()
        }
    }

    struct CountingObserver {
        chunks: AtomicU64,
        last_total: AtomicU64,
    }

    impl IngestObserver for CountingObserver {
        fn on_chunk(&self, bytes_so_far: u64, _declared_size: Option<u64>) {
            self.chunks.fetch_add(1, Ordering::SeqCst);
            self.last_total.store(bytes_so_far, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_hash_and_exact_size() {
        let data = b"hello world";
        let res = stream_to_temp(&data[..], ".txt", None, &config_with(4096, 1024), &NoopObserver)
            .await
            .unwrap();
        assert_eq!(res.hash, HELLO_HASH);
        assert_eq!(res.size, 11);
        assert_eq!(std::fs::read(res.path()).unwrap(), data);
    }

    #[tokio::test]
    async fn test_hash_stable_across_chunk_sizes() {
        let data = b"hello world";
        let one_chunk =
            stream_to_temp(&data[..], "", None, &config_with(4096, 1024), &NoopObserver)
                .await
                .unwrap();
        let tiny_chunks = stream_to_temp(&data[..], "", None, &config_with(3, 1024), &NoopObserver)
            .await
            .unwrap();
        assert_eq!(one_chunk.hash, tiny_chunks.hash);
        assert_eq!(one_chunk.size, tiny_chunks.size);
    }

    #[tokio::test]
    async fn test_declared_size_over_cap_fails_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![0u8; 16];
        let err = stream_to_temp_in(
            dir.path(),
            &data[..],
            "",
            Some(250 * 1024 * 1024),
            &config_with(4096, 200 * 1024 * 1024),
            &NoopObserver,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IngestError::SizeLimitExceeded { .. }));
        // Nothing was created
        assert_eq!(dir.path().read_dir().unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_streamed_size_over_cap_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = vec![7u8; 100];
        let err = stream_to_temp_in(
            dir.path(),
            &data[..],
            ".bin",
            None,
            &config_with(16, 64),
            &NoopObserver,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IngestError::SizeLimitExceeded { .. }));
        assert_eq!(dir.path().read_dir().unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_exactly_at_cap_succeeds() {
        let data = vec![1u8; 64];
        let res = stream_to_temp(&data[..], "", None, &config_with(16, 64), &NoopObserver)
            .await
            .unwrap();
        assert_eq!(res.size, 64);
    }

    #[tokio::test]
    async fn test_observer_sees_running_total() {
        let observer = CountingObserver {
            chunks: AtomicU64::new(0),
            last_total: AtomicU64::new(0),
        };
        let data = vec![2u8; 10];
        stream_to_temp(&data[..], "", Some(10), &config_with(4, 1024), &observer)
            .await
            .unwrap();
        assert_eq!(observer.chunks.load(Ordering::SeqCst), 3); // 4 + 4 + 2
        assert_eq!(observer.last_total.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_temp_file_removed_on_drop() {
        let res = stream_to_temp(&b"x"[..], "", None, &config_with(4, 64), &NoopObserver)
            .await
            .unwrap();
        let path = res.path().to_path_buf();
        assert!(path.exists());
        drop(res);
        assert!(!path.exists());
    }
}
