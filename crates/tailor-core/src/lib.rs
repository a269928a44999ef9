//! Tailor Core - garment classification and catalogue write-back.
//!
//! Tailor reads product rows from a Postgres table, downloads each row's
//! image, classifies the garment against a directory of reference images, and
//! writes a generated title and description back to the row.
//!
//! # Architecture
//!
//! ```text
//! Row → Download → Validate → Decode → Embed (CLIP) → Nearest reference
//!     → Broad category → Title/Description → UPDATE + JSON audit
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tailor_core::{Classifier, Config, EmbeddingEngine, ImageProcessor, ReferenceStore};
//!
//! #[tokio::main]
//! async fn main() -> tailor_core::Result<()> {
//!     let config = Config::load()?;
//!     let engine = EmbeddingEngine::load(&config.embedding, &config.model_dir())?;
//!     let processor = ImageProcessor::new(&config, Arc::new(engine));
//!     let store = ReferenceStore::load(&config.reference_dir(), &processor).await?;
//!     let classifier = Classifier::new(store, processor, &config.classification)?;
//!
//!     let result = classifier.classify_file("./kurti.jpg".as_ref(), 3).await;
//!     println!("{} ({:.2})", result.category, result.confidence);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod content;
pub mod db;
pub mod embedding;
pub mod error;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod taxonomy;
pub mod types;

pub use batch::{BatchRunner, RunEvent, RunOptions};
pub use classify::Classifier;
pub use config::Config;
pub use content::{ContentGenerator, GeneratedContent};
pub use db::{CatalogStore, CatalogTable, PgSession, TableName};
pub use embedding::{EmbeddingEngine, ImageEmbedder};
pub use error::{
    ConfigError, DatabaseError, DatabaseResult, PipelineError, PipelineResult, Result, TailorError,
};
pub use output::{AuditWriter, OutputFormat};
pub use pipeline::{HttpFetcher, ImageFetcher, ImageProcessor};
pub use reference::ReferenceStore;
pub use types::{
    AuditRecord, CategoryScore, ClassificationResult, EvaluationReport, RecordId, RunSummary,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
