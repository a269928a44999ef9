//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,

    /// Root of the reference image tree (one subdirectory per category)
    pub reference_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.tailor/models"),
            reference_dir: PathBuf::from("reference_images"),
        }
    }
}

/// Postgres connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,

    pub port: u16,

    /// Database name
    pub name: String,

    pub user: String,

    /// Password (supports ${ENV_VAR} syntax)
    pub password: String,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "${TAILOR_DB_PASSWORD}".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Which table and columns hold the catalogue rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Source table name
    pub table: String,

    /// Column holding the image URL
    pub image_column: String,

    /// Primary key column
    pub id_column: String,

    /// Column receiving the generated title
    pub title_column: String,

    /// Column receiving the generated description
    pub description_column: String,

    /// Extra SQL predicate ANDed into the candidate query (trusted input)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Maximum number of rows to process per run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            table: "garments".to_string(),
            image_column: "image_url".to_string(),
            id_column: "id".to_string(),
            title_column: "garment_title".to_string(),
            description_column: "garment_description".to_string(),
            filter: None,
            max_rows: None,
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Minimum top similarity needed to accept a category.
    /// CLIP image-to-image cosine similarities sit well above zero even for
    /// unrelated garments, so this is a floor against non-garment images.
    pub threshold: f32,

    /// Number of ranked predictions kept per image
    pub top_k: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            top_k: 3,
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Rows per batch; one audit file is written per batch
    pub batch_size: usize,

    /// Copy the source table before any row is updated
    pub backup_table: bool,

    /// Classify and audit without touching the database
    pub dry_run: bool,

    /// Seed for title/description selection (random when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Reference image extensions
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            backup_table: true,
            dry_run: false,
            seed: None,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Image download timeout in milliseconds
    pub download_timeout_ms: u64,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_image_dimension: 10000,
            download_timeout_ms: 30000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model directory name under `general.model_dir`
    pub model: String,

    /// Square input size of the visual encoder
    pub image_size: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "clip-vit-base-patch32".to_string(),
            image_size: 224,
        }
    }
}

/// Audit output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving batch and run audit files
    pub dir: PathBuf,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
