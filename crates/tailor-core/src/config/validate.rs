//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.classification.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ValidationError(
                "classification.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.classification.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "classification.top_k must be > 0".into(),
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "processing.batch_size must be > 0".into(),
            ));
        }
        if self.catalog.max_rows == Some(0) {
            return Err(ConfigError::ValidationError(
                "catalog.max_rows must be > 0 when set".into(),
            ));
        }
        for (key, value) in [
            ("catalog.table", &self.catalog.table),
            ("catalog.image_column", &self.catalog.image_column),
            ("catalog.id_column", &self.catalog.id_column),
            ("catalog.title_column", &self.catalog.title_column),
            ("catalog.description_column", &self.catalog.description_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must not be empty"
                )));
            }
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.download_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.download_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.embedding.image_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.image_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}
