//! CLIP embedding generation.
//!
//! Converts images into unit-length vectors using a CLIP ViT-B/32 visual
//! encoder running locally via ONNX Runtime. The rest of the crate only sees
//! the [`ImageEmbedder`] trait, so the reference store and classifier can be
//! exercised with hand-built vectors.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tailor_core::embedding::{EmbeddingEngine, ImageEmbedder};
//! use tailor_core::Config;
//!
//! let config = Config::default();
//! let engine = EmbeddingEngine::load(&config.embedding, &config.model_dir())?;
//! let embedding = engine.embed(&decoded_image, path)?;
//! ```

pub(crate) mod clip;
pub(crate) mod preprocess;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::EmbeddingConfig;
use crate::error::PipelineError;

use self::clip::ClipSession;
use self::preprocess::preprocess;

/// The visual encoder ONNX model filename.
pub const VISUAL_MODEL_FILENAME: &str = "visual.onnx";

/// Anything that turns an image into a fixed-length embedding.
///
/// Implementations return unit-length vectors of one fixed dimensionality.
pub trait ImageEmbedder: Send + Sync {
    /// Embed a decoded image. `path` is only used for error context.
    fn embed(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, PipelineError>;
}

/// Engine for generating image embeddings via CLIP.
pub struct EmbeddingEngine {
    session: ClipSession,
    image_size: u32,
}

impl EmbeddingEngine {
    /// Load the CLIP visual encoder from the model directory.
    ///
    /// Expects the ONNX model at `{model_dir}/{model_name}/visual.onnx`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, PipelineError> {
        let model_path = Self::model_path(config, model_dir);

        if !model_path.exists() {
            return Err(PipelineError::Embedding {
                path: model_path,
                message: "Model not found. Run `tailor models download` first.".to_string(),
            });
        }

        tracing::info!("Loading CLIP model from {:?}", model_path);
        let session = ClipSession::load(&model_path)?;
        tracing::info!("CLIP model loaded successfully");

        Ok(Self {
            session,
            image_size: config.image_size,
        })
    }

    /// Get the image input size for this model.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Check whether the model files exist on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        Self::model_path(config, model_dir).exists()
    }

    /// Get the expected model file path.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(VISUAL_MODEL_FILENAME)
    }
}

impl ImageEmbedder for EmbeddingEngine {
    fn embed(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let tensor = preprocess(image, self.image_size);
        self.session.embed(&tensor, path)
    }
}
