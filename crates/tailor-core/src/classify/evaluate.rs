//! Accuracy over a labelled image directory.
//!
//! The directory is laid out like the reference directory: one subdirectory
//! per true category.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::pipeline::{FileDiscovery, ImageProcessor};
use crate::types::{CategoryAccuracy, EvaluationReport};

/// An image whose true category is known.
#[derive(Debug, Clone)]
pub struct LabelledImage {
    pub path: PathBuf,
    pub category: String,
}

/// Collect labelled images from `root/<category>/*`.
pub fn labelled_samples(
    root: &Path,
    processor: &ImageProcessor,
) -> Result<Vec<LabelledImage>, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::FileNotFound(root.to_path_buf()));
    }
    let samples = FileDiscovery::category_dirs(root)
        .into_iter()
        .flat_map(|(category, dir)| {
            processor
                .images_in(&dir)
                .into_iter()
                .map(move |f| LabelledImage {
                    path: f.path,
                    category: category.clone(),
                })
        })
        .collect();
    Ok(samples)
}

/// Aggregate `(true, predicted)` pairs into overall and per-category accuracy.
///
/// Per-category entries are sorted by category name. Empty input yields 0.0.
pub fn accuracy_report(outcomes: &[(String, String)]) -> EvaluationReport {
    let mut per_category: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    let mut correct = 0;

    for (truth, predicted) in outcomes {
        let entry = per_category.entry(truth.as_str()).or_default();
        entry.1 += 1;
        if truth == predicted {
            entry.0 += 1;
            correct += 1;
        }
    }

    let total = outcomes.len();
    EvaluationReport {
        accuracy: ratio(correct, total),
        correct,
        total,
        per_category: per_category
            .into_iter()
            .map(|(category, (correct, total))| CategoryAccuracy {
                category: category.to_string(),
                correct,
                total,
                accuracy: ratio(correct, total),
            })
            .collect(),
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;
    use crate::pipeline::processor::testing::MeanColorEmbedder;

    fn pair(t: &str, p: &str) -> (String, String) {
        (t.to_string(), p.to_string())
    }

    #[test]
    fn test_accuracy_report() {
        let report = accuracy_report(&[
            pair("Saree", "Saree"),
            pair("Saree", "Others"),
            pair("Kurti", "Kurti"),
            pair("Kurti", "Kurti"),
        ]);
        assert_eq!(report.correct, 3);
        assert_eq!(report.total, 4);
        assert!((report.accuracy - 0.75).abs() < 1e-9);
        assert_eq!(report.per_category[0].category, "Kurti");
        assert!((report.per_category[0].accuracy - 1.0).abs() < 1e-9);
        assert!((report.per_category[1].accuracy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_report() {
        let report = accuracy_report(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);
        assert!(report.per_category.is_empty());
    }

    #[test]
    fn test_labelled_samples_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Saree")).unwrap();
        std::fs::create_dir(dir.path().join("Gown")).unwrap();
        std::fs::write(dir.path().join("Saree/1.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("Gown/1.png"), b"x").unwrap();
        std::fs::write(dir.path().join("Gown/readme.md"), b"x").unwrap();

        let processor = ImageProcessor::new(&Config::default(), Arc::new(MeanColorEmbedder));
        let samples = labelled_samples(dir.path(), &processor).unwrap();
        let labels: Vec<&str> = samples.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(labels, vec!["Gown", "Saree"]);
    }
}
