use std::env;

/// Conversion pipeline configuration
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Hard cap on a single upload in bytes (default: 200 MB)
    pub max_file_size: u64,

    /// Advisory threshold in bytes; uploads above it get a warning,
    /// not a rejection (default: 50 MB)
    pub warn_threshold: u64,

    /// Chunk size for the save-while-hash loop in bytes (default: 4 MB)
    pub chunk_size: usize,

    /// Number of characters returned as the markdown preview (default: 1000)
    pub preview_chars: usize,

    /// Maximum request body size in bytes; a batch may carry several files
    /// up to the per-file cap each (default: 1 GB)
    pub max_request_size: usize,

    /// Enforce the extension allow-list (default: true). When false, any
    /// extension is accepted and type-routing is left to the converter.
    pub restrict_extensions: bool,

    /// Converter type: "markitdown" or "passthrough" (default: "markitdown")
    pub converter_type: String,

    /// Command invoked by the markitdown converter (default: "markitdown")
    pub converter_command: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_file_size: 200 * 1024 * 1024, // 200 MB
            warn_threshold: 50 * 1024 * 1024, // 50 MB
            chunk_size: 4 * 1024 * 1024,      // 4 MB
            preview_chars: 1000,
            max_request_size: 1024 * 1024 * 1024, // 1 GB
            restrict_extensions: true,
            converter_type: "markitdown".to_string(),
            converter_command: "markitdown".to_string(),
        }
    }
}

impl ConvertConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            warn_threshold: env::var("WARN_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.warn_threshold),

            chunk_size: env::var("CHUNK_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.chunk_size),

            preview_chars: env::var("PREVIEW_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.preview_chars),

            max_request_size: env::var("MAX_REQUEST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_request_size),

            restrict_extensions: env::var("RESTRICT_EXTENSIONS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.restrict_extensions),

            converter_type: env::var("CONVERTER_TYPE").unwrap_or(default.converter_type),

            converter_command: env::var("CONVERTER_COMMAND").unwrap_or(default.converter_command),
        }
    }

    /// Create config for development (passthrough converter, any extension)
    pub fn development() -> Self {
        Self {
            restrict_extensions: false,
            converter_type: "passthrough".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConvertConfig::default();
        assert_eq!(config.max_file_size, 200 * 1024 * 1024);
        assert_eq!(config.warn_threshold, 50 * 1024 * 1024);
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
        assert_eq!(config.preview_chars, 1000);
        assert!(config.restrict_extensions);
        assert_eq!(config.converter_type, "markitdown");
    }

    #[test]
    fn test_development_config() {
        let config = ConvertConfig::development();
        assert!(!config.restrict_extensions);
        assert_eq!(config.converter_type, "passthrough");
        assert_eq!(config.max_file_size, 200 * 1024 * 1024);
    }

    #[test]
    fn test_warn_threshold_below_cap() {
        let config = ConvertConfig::default();
        assert!(config.warn_threshold < config.max_file_size);
    }
}
