//! Reference exemplars: one directory of images per category.
//!
//! ```text
//! reference_images/
//! ├── Anarkali_Suit/   a.jpg b.png ...
//! ├── Banarasi_Saree/  ...
//! └── Kurti/           ...
//! ```
//!
//! Each image is embedded once at startup and kept for the process lifetime.

use std::path::Path;

use crate::error::PipelineError;
use crate::pipeline::{FileDiscovery, ImageProcessor};

/// A category and the embeddings of its exemplar images.
#[derive(Debug, Clone)]
pub struct ReferenceCategory {
    pub name: String,
    pub embeddings: Vec<Vec<f32>>,
}

/// All reference categories, in ascending name order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    categories: Vec<ReferenceCategory>,
}

impl ReferenceStore {
    /// Embed every exemplar under `root`.
    ///
    /// Unreadable images are skipped with a warning; categories left with no
    /// embeddings are dropped. A missing root is an error.
    pub async fn load(root: &Path, processor: &ImageProcessor) -> Result<Self, PipelineError> {
        if !root.is_dir() {
            return Err(PipelineError::FileNotFound(root.to_path_buf()));
        }

        tracing::info!("Loading reference images from {:?}", root);
        let mut categories = Vec::new();

        for (name, dir) in FileDiscovery::category_dirs(root) {
            let mut embeddings = Vec::new();
            for file in processor.images_in(&dir) {
                match processor.embed_file(&file.path).await {
                    Ok(embedding) => embeddings.push(embedding),
                    Err(e) => tracing::warn!("Skipping reference image: {}", e),
                }
            }

            if embeddings.is_empty() {
                tracing::debug!("No usable images for category {}, omitting", name);
                continue;
            }
            tracing::debug!("Loaded {} reference images for {}", embeddings.len(), name);
            categories.push(ReferenceCategory { name, embeddings });
        }

        let store = Self::from_categories(categories);
        tracing::info!(
            "Loaded {} categories ({} reference images)",
            store.len(),
            store.image_count()
        );
        Ok(store)
    }

    /// Build a store from precomputed embeddings. Categories are sorted by name.
    pub fn from_categories(mut categories: Vec<ReferenceCategory>) -> Self {
        categories.retain(|c| !c.embeddings.is_empty());
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Self { categories }
    }

    pub fn categories(&self) -> &[ReferenceCategory] {
        &self.categories
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of exemplar embeddings.
    pub fn image_count(&self) -> usize {
        self.categories.iter().map(|c| c.embeddings.len()).sum()
    }
}
