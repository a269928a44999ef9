//! Shared setup: connection and catalogue overrides, classifier loading.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tailor_core::config::{CatalogConfig, DatabaseConfig};
use tailor_core::{Classifier, Config, EmbeddingEngine, ImageProcessor, ReferenceStore};

/// Connection overrides. Unset flags keep the config file values.
#[derive(Args, Debug, Default, Clone)]
pub struct DatabaseArgs {
    /// Database host
    #[arg(long, env = "TAILOR_DB_HOST")]
    pub db_host: Option<String>,

    /// Database port
    #[arg(long, env = "TAILOR_DB_PORT")]
    pub db_port: Option<u16>,

    /// Database name
    #[arg(long, env = "TAILOR_DB_NAME")]
    pub db_name: Option<String>,

    /// Database user
    #[arg(long, env = "TAILOR_DB_USER")]
    pub db_user: Option<String>,

    /// Database password
    #[arg(long, env = "TAILOR_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
}

impl DatabaseArgs {
    pub fn apply(&self, config: &mut DatabaseConfig) {
        if let Some(host) = &self.db_host {
            config.host = host.clone();
        }
        if let Some(port) = self.db_port {
            config.port = port;
        }
        if let Some(name) = &self.db_name {
            config.name = name.clone();
        }
        if let Some(user) = &self.db_user {
            config.user = user.clone();
        }
        if let Some(password) = &self.db_password {
            config.password = password.clone();
        }
    }
}

/// Target table and column overrides.
#[derive(Args, Debug, Default, Clone)]
pub struct CatalogArgs {
    /// Table holding the catalogue rows (`table` or `schema.table`)
    #[arg(long)]
    pub table: Option<String>,

    /// Column holding the image URL
    #[arg(long)]
    pub image_column: Option<String>,

    /// Primary key column
    #[arg(long)]
    pub id_column: Option<String>,

    /// Column receiving the generated title
    #[arg(long)]
    pub title_column: Option<String>,

    /// Column receiving the generated description
    #[arg(long)]
    pub description_column: Option<String>,

    /// Extra SQL predicate for candidate rows, e.g. "garment_title IS NULL"
    #[arg(long)]
    pub filter: Option<String>,

    /// Process at most this many rows
    #[arg(long)]
    pub max_rows: Option<usize>,
}

impl CatalogArgs {
    pub fn apply(&self, config: &mut CatalogConfig) {
        let columns = [
            (&self.table, &mut config.table),
            (&self.image_column, &mut config.image_column),
            (&self.id_column, &mut config.id_column),
            (&self.title_column, &mut config.title_column),
            (&self.description_column, &mut config.description_column),
        ];
        for (arg, field) in columns {
            if let Some(value) = arg {
                *field = value.clone();
            }
        }
        if self.filter.is_some() {
            config.filter = self.filter.clone();
        }
        if self.max_rows.is_some() {
            config.max_rows = self.max_rows;
        }
    }
}

/// Load the encoder, embed the reference tree and build a classifier.
///
/// `reference_dir` overrides `general.reference_dir`.
pub async fn load_classifier(
    config: &Config,
    reference_dir: Option<PathBuf>,
) -> anyhow::Result<Classifier> {
    let model_dir = config.model_dir();
    if !EmbeddingEngine::model_exists(&config.embedding, &model_dir) {
        anyhow::bail!(
            "Embedding model not found at {}\n\n  Hint: Run `tailor models download` first.",
            EmbeddingEngine::model_path(&config.embedding, &model_dir).display()
        );
    }
    let engine = EmbeddingEngine::load(&config.embedding, &model_dir)?;
    let processor = ImageProcessor::new(config, Arc::new(engine));

    let root = reference_dir.unwrap_or_else(|| config.reference_dir());
    tracing::info!("Loading reference images from {:?}", root);
    let store = ReferenceStore::load(&root, &processor)
        .await
        .with_context(|| format!("Failed to load reference images from {}", root.display()))?;
    tracing::info!(
        "Loaded {} categories ({} reference images)",
        store.len(),
        store.image_count()
    );

    Ok(Classifier::new(store, processor, &config.classification)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_keep_config() {
        let mut config = Config::default();
        DatabaseArgs::default().apply(&mut config.database);
        CatalogArgs::default().apply(&mut config.catalog);

        let defaults = Config::default();
        assert_eq!(config.database.host, defaults.database.host);
        assert_eq!(config.database.password, defaults.database.password);
        assert_eq!(config.catalog.table, defaults.catalog.table);
        assert!(config.catalog.filter.is_none());
    }

    #[test]
    fn overrides_replace_fields() {
        let mut config = Config::default();
        let db = DatabaseArgs {
            db_host: Some("db.internal".into()),
            db_port: Some(6543),
            db_password: Some("hunter2".into()),
            ..DatabaseArgs::default()
        };
        let catalog = CatalogArgs {
            table: Some("shop.products".into()),
            image_column: Some("photo".into()),
            filter: Some("garment_title IS NULL".into()),
            max_rows: Some(25),
            ..CatalogArgs::default()
        };
        db.apply(&mut config.database);
        catalog.apply(&mut config.catalog);

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.resolved_password().as_deref(), Some("hunter2"));
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.catalog.table, "shop.products");
        assert_eq!(config.catalog.image_column, "photo");
        assert_eq!(config.catalog.id_column, "id");
        assert_eq!(config.catalog.filter.as_deref(), Some("garment_title IS NULL"));
        assert_eq!(config.catalog.max_rows, Some(25));
    }

    #[tokio::test]
    async fn missing_model_is_reported_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().to_path_buf();

        let err = load_classifier(&config, None).await.err().unwrap();
        assert!(err.to_string().contains("tailor models download"));
    }
}
