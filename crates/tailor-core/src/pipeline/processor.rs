//! Turns an image (file or downloaded bytes) into an embedding.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::ImageEmbedder;
use crate::error::PipelineResult;

use super::decode::ImageDecoder;
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::validate::Validator;

/// Validate → decode → embed, shared by reference loading and classification.
pub struct ImageProcessor {
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    embedder: Arc<dyn ImageEmbedder>,
}

impl ImageProcessor {
    /// Create a processor around an embedding model.
    pub fn new(config: &Config, embedder: Arc<dyn ImageEmbedder>) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            embedder,
        }
    }

    /// Embed an image file on disk.
    pub async fn embed_file(&self, path: &Path) -> PipelineResult<Vec<f32>> {
        let start = std::time::Instant::now();

        self.validator.validate_file(path)?;
        let decoded = self.decoder.decode(path).await?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let embedding = self.embedder.embed(&decoded.image, path)?;
        tracing::debug!(
            "Embedded {:?} in {:?} ({}x{})",
            path,
            start.elapsed(),
            decoded.width,
            decoded.height
        );
        Ok(embedding)
    }

    /// Embed an in-memory image. `path` is only used in error messages.
    pub async fn embed_bytes(&self, bytes: Vec<u8>, path: &Path) -> PipelineResult<Vec<f32>> {
        self.validator.validate_bytes(&bytes, path)?;
        let decoded = self.decoder.decode_from_bytes(bytes, path).await?;
        self.embedder.embed(&decoded.image, path)
    }

    /// Discover all image files at a path, recursively.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Image files directly inside a directory.
    pub fn images_in(&self, dir: &Path) -> Vec<DiscoveredFile> {
        self.discovery.images_in(dir)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use image::{DynamicImage, GenericImageView};

    use crate::embedding::ImageEmbedder;
    use crate::error::PipelineError;
    use crate::math::l2_normalize;

    /// Embeds an image as its normalized mean colour.
    ///
    /// Solid-colour test images therefore embed to their colour direction.
    pub struct MeanColorEmbedder;

    impl ImageEmbedder for MeanColorEmbedder {
        fn embed(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, PipelineError> {
            let rgb = image.to_rgb8();
            let (w, h) = image.dimensions();
            if w == 0 || h == 0 {
                return Err(PipelineError::Embedding {
                    path: path.to_path_buf(),
                    message: "empty image".into(),
                });
            }
            let mut sum = [0f32; 3];
            for p in rgb.pixels() {
                for (s, c) in sum.iter_mut().zip(p.0) {
                    *s += c as f32;
                }
            }
            Ok(l2_normalize(&sum))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MeanColorEmbedder;
    use super::*;
    use crate::pipeline::decode::png_bytes;

    fn processor() -> ImageProcessor {
        ImageProcessor::new(&Config::default(), Arc::new(MeanColorEmbedder))
    }

    #[tokio::test]
    async fn test_embed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        std::fs::write(&path, png_bytes(4, 4, [200, 0, 0])).unwrap();

        let embedding = processor().embed_file(&path).await.unwrap();
        assert!((embedding[0] - 1.0).abs() < 1e-6);
        assert!(embedding[1].abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embed_bytes_rejects_html() {
        let err = processor()
            .embed_bytes(b"<html>nope</html>".to_vec(), Path::new("row-1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("magic bytes"));
    }
}
