//! Configuration management for Tailor.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults; every section implements `Default` so a partial file is enough.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Tailor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Postgres connection
    pub database: DatabaseConfig,

    /// Source table and columns
    pub catalog: CatalogConfig,

    /// Classification settings
    pub classification: ClassificationConfig,

    /// Batch processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Embedding model settings
    pub embedding: EmbeddingConfig,

    /// Audit output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.tailor.tailor/config.toml
    /// - Linux: ~/.config/tailor/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\tailor\config\config.toml
    ///
    /// Falls back to ~/.tailor/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "tailor", "tailor")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".tailor").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        expand_path(&self.general.model_dir)
    }

    /// Get the resolved reference image directory (with ~ expansion).
    pub fn reference_dir(&self) -> PathBuf {
        expand_path(&self.general.reference_dir)
    }

    /// Get the resolved audit output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand_path(&self.output.dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Re-run validation after CLI overrides have been applied.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()
    }
}

impl DatabaseConfig {
    /// Password with `${ENV_VAR}` references resolved.
    ///
    /// `None` when the value is empty or names an unset variable.
    pub fn resolved_password(&self) -> Option<String> {
        resolve_env_var(&self.password)
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
