use anyhow::{Result, anyhow};
use std::path::Path;
use tokio::process::Command;

/// Trait for document-to-Markdown conversion engines.
///
/// The engine is a black box invoked on a saved file path. Calls may be
/// slow and blocking; the pipeline issues one call per file and never
/// assumes it returns quickly.
#[async_trait::async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert the document at `path` to Markdown text. An empty string is
    /// a valid result (image-only or unsupported content).
    async fn convert(&self, path: &Path) -> Result<String>;

    /// Check if the converter is available/healthy
    async fn health_check(&self) -> bool;
}

/// Converter that shells out to the `markitdown` CLI (or any compatible
/// command that prints Markdown for a given input path).
pub struct MarkItDownConverter {
    command: String,
}

impl MarkItDownConverter {
    pub fn new(command: String) -> Self {
        Self { command }
    }

    pub fn from_env() -> Self {
        let command =
            std::env::var("CONVERTER_COMMAND").unwrap_or_else(|_| "markitdown".to_string());
        Self::new(command)
    }
}

#[async_trait::async_trait]
impl DocumentConverter for MarkItDownConverter {
    async fn convert(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.command)
            .arg(path)
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run converter '{}': {}", self.command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "Converter '{}' exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn health_check(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

/// Converter for development/testing: returns the file content as text
/// without any real parsing
pub struct PassthroughConverter;

#[async_trait::async_trait]
impl DocumentConverter for PassthroughConverter {
    async fn convert(&self, path: &Path) -> Result<String> {
        tracing::warn!("PassthroughConverter: returning raw file content (development mode)");
        let bytes = tokio::fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Converter that always fails (for testing the failure path)
#[cfg(test)]
pub struct AlwaysFailingConverter;

#[cfg(test)]
#[async_trait::async_trait]
impl DocumentConverter for AlwaysFailingConverter {
    async fn convert(&self, _path: &Path) -> Result<String> {
        Err(anyhow!("conversion engine exploded"))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Factory function to create the appropriate converter based on config
pub fn create_converter(converter_type: &str, command: &str) -> Box<dyn DocumentConverter> {
    match converter_type.to_lowercase().as_str() {
        "markitdown" => Box::new(MarkItDownConverter::new(command.to_string())),
        "passthrough" | "noop" => Box::new(PassthroughConverter),
        _ => {
            tracing::warn!(
                "Unknown converter type '{}', using PassthroughConverter",
                converter_type
            );
            Box::new(PassthroughConverter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_passthrough_converter() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"# Already markdown\n").unwrap();

        let converter = PassthroughConverter;
        let text = converter.convert(tmp.path()).await.unwrap();
        assert_eq!(text, "# Already markdown");
        assert!(converter.health_check().await);
    }

    #[tokio::test]
    async fn test_failing_converter() {
        let converter = AlwaysFailingConverter;
        let err = converter.convert(Path::new("/nonexistent")).await.unwrap_err();
        assert!(err.to_string().contains("exploded"));
        assert!(!converter.health_check().await);
    }

    #[tokio::test]
    async fn test_create_converter() {
        let converter = create_converter("passthrough", "markitdown");
        assert!(converter.health_check().await);

        let converter = create_converter("unknown-kind", "markitdown");
        assert!(converter.health_check().await);
    }

    #[tokio::test]
    async fn test_markitdown_missing_command_errors() {
        let converter = MarkItDownConverter::new("definitely-not-a-real-binary".to_string());
        assert!(converter.convert(Path::new("/tmp/x.txt")).await.is_err());
        assert!(!converter.health_check().await);
    }
}
