//! Error types for Tailor.
//!
//! Errors are organized by concern so that callers can tell a fatal failure
//! (bad config, unreachable database) from a per-image failure that only
//! skips one row.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Tailor operations.
#[derive(Error, Debug)]
pub enum TailorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-image pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Catalogue database errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-image errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image download failed (network error or non-2xx status)
    #[error("Download failed for {url}: {message}")]
    Download {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Embedding generation failed
    #[error("Embedding failed for {path}: {message}")]
    Embedding { path: PathBuf, message: String },

    /// Model or reference set problem (not tied to a single image)
    #[error("Model error: {message}")]
    Model { message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Catalogue database errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Could not open a session
    #[error("Failed to connect to {host}:{port}/{database}: {source}")]
    Connect {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A statement failed
    #[error("{context}: {source}")]
    Query {
        context: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A table or column name was rejected before reaching SQL
    #[error("Invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// The identifier column has a type that cannot be read
    #[error("Unsupported id value in column {column}: {message}")]
    UnsupportedIdType { column: String, message: String },
}

impl DatabaseError {
    /// Wrap a postgres error with a short description of what was attempted.
    pub fn query(context: impl Into<String>, source: tokio_postgres::Error) -> Self {
        Self::Query {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Tailor results.
pub type Result<T> = std::result::Result<T, TailorError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for database-specific results.
pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_message_includes_url() {
        let err = PipelineError::Download {
            url: "https://cdn.example.com/a.jpg".to_string(),
            message: "HTTP 404".to_string(),
            status_code: Some(404),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://cdn.example.com/a.jpg"));
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn test_invalid_identifier_message() {
        let err = DatabaseError::InvalidIdentifier {
            name: "".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_config_error_converts_to_top_level() {
        let err: TailorError = ConfigError::ValidationError("bad".into()).into();
        assert!(matches!(err, TailorError::Config(_)));
    }
}
