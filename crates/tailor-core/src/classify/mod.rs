//! Nearest-exemplar garment classification.
//!
//! A query image is embedded and compared against every reference category.
//! A category's score is the best cosine similarity against any of its
//! exemplars; categories are ranked by that score and the winner is accepted
//! only if it clears the configured threshold.

mod evaluate;

pub use evaluate::{accuracy_report, labelled_samples, LabelledImage};

use std::path::Path;

use crate::config::ClassificationConfig;
use crate::error::PipelineError;
use crate::math::max_cosine_similarity;
use crate::pipeline::ImageProcessor;
use crate::reference::ReferenceStore;
use crate::types::{CategoryScore, ClassificationResult, EvaluationReport, UNCLASSIFIED};

/// Classifies images against a loaded [`ReferenceStore`].
pub struct Classifier {
    store: ReferenceStore,
    processor: ImageProcessor,
    threshold: f32,
}

impl Classifier {
    /// Fails if the store has no categories.
    pub fn new(
        store: ReferenceStore,
        processor: ImageProcessor,
        config: &ClassificationConfig,
    ) -> Result<Self, PipelineError> {
        if store.is_empty() {
            return Err(PipelineError::Model {
                message: "No reference categories loaded; check the reference image directory"
                    .to_string(),
            });
        }
        Ok(Self {
            store,
            processor,
            threshold: config.threshold,
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    /// Every category scored against `embedding`, best first.
    ///
    /// The sort is stable, so ties keep ascending name order.
    pub fn rank(&self, embedding: &[f32]) -> Vec<CategoryScore> {
        let mut scores: Vec<CategoryScore> = self
            .store
            .categories()
            .iter()
            .map(|c| {
                let confidence = max_cosine_similarity(embedding, &c.embeddings).unwrap_or(0.0);
                CategoryScore {
                    category: c.name.clone(),
                    confidence,
                    accepted: confidence >= self.threshold,
                }
            })
            .collect();
        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        scores
    }

    /// Classify an already computed embedding.
    pub fn classify_embedding(
        &self,
        source: impl Into<String>,
        embedding: &[f32],
        top_k: usize,
    ) -> ClassificationResult {
        let all_scores = self.rank(embedding);
        let top_predictions: Vec<CategoryScore> =
            all_scores.iter().take(top_k).cloned().collect();

        let (category, confidence, accepted) = match all_scores.first() {
            Some(best) if best.accepted => (best.category.clone(), best.confidence, true),
            Some(best) => (UNCLASSIFIED.to_string(), best.confidence, false),
            None => (UNCLASSIFIED.to_string(), 0.0, false),
        };

        ClassificationResult {
            source: source.into(),
            category,
            confidence,
            accepted,
            top_predictions,
            all_scores,
            error: None,
        }
    }

    /// Classify an image file. Failures become an error result.
    pub async fn classify_file(&self, path: &Path, top_k: usize) -> ClassificationResult {
        let source = path.display().to_string();
        match self.processor.embed_file(path).await {
            Ok(embedding) => self.classify_embedding(source, &embedding, top_k),
            Err(e) => {
                tracing::warn!("Failed to classify {}: {}", source, e);
                ClassificationResult::failed(source, e)
            }
        }
    }

    /// Classify downloaded bytes. `path` names the scratch file for errors.
    pub async fn classify_bytes(
        &self,
        source: &str,
        bytes: Vec<u8>,
        path: &Path,
        top_k: usize,
    ) -> ClassificationResult {
        match self.processor.embed_bytes(bytes, path).await {
            Ok(embedding) => self.classify_embedding(source, &embedding, top_k),
            Err(e) => {
                tracing::warn!("Failed to classify {}: {}", source, e);
                ClassificationResult::failed(source, e)
            }
        }
    }

    /// Classify files one after another, in the given order.
    pub async fn classify_batch(&self, paths: &[&Path], top_k: usize) -> Vec<ClassificationResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.classify_file(path, top_k).await);
        }
        results
    }

    /// Accuracy against images whose true category is known.
    pub async fn evaluate(&self, samples: &[LabelledImage]) -> EvaluationReport {
        let mut outcomes = Vec::with_capacity(samples.len());
        for sample in samples {
            let result = self.classify_file(&sample.path, 1).await;
            outcomes.push((sample.category.clone(), result.category));
        }
        accuracy_report(&outcomes)
    }

    /// Image discovery shared with the processor.
    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }
}
