//! Core data types produced by classification and batch runs.
//!
//! Everything here is serialized into the JSON audit trail, so field names are
//! part of the output format.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Category chosen when the best score is below the acceptance threshold.
pub const UNCLASSIFIED: &str = "Others";

/// Category reported when an image could not be classified at all.
pub const ERROR_CATEGORY: &str = "Error";

/// One category's score against a query image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Reference category name
    pub category: String,

    /// Highest cosine similarity against any of the category's exemplars
    pub confidence: f32,

    /// Whether `confidence` clears the threshold
    pub accepted: bool,
}

/// The outcome of classifying one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Path or URL the image came from
    pub source: String,

    /// Best category, [`UNCLASSIFIED`] below threshold, or [`ERROR_CATEGORY`]
    pub category: String,

    /// Top score (0.0 for errors)
    pub confidence: f32,

    /// Top score cleared the threshold
    pub accepted: bool,

    /// The first `top_k` entries of the ranking
    pub top_predictions: Vec<CategoryScore>,

    /// Every category, ranked
    pub all_scores: Vec<CategoryScore>,

    /// Why classification failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassificationResult {
    /// A failed classification carrying the error message.
    pub fn failed(source: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            source: source.into(),
            category: ERROR_CATEGORY.to_string(),
            confidence: 0.0,
            accepted: false,
            top_predictions: vec![],
            all_scores: vec![],
            error: Some(error.to_string()),
        }
    }

    /// Whether this result represents a failure rather than a prediction.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Primary key of a catalogue row.
///
/// Integer keys are kept as integers so updates can bind them natively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A row selected for classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub id: RecordId,
    pub image_url: String,
}

/// One entry in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: RecordId,

    pub image_url: String,

    /// BLAKE3 of the downloaded bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    pub classification: ClassificationResult,

    /// Normalized category (absent for failed rows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broad_category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the write-back succeeded (always false in dry-run)
    pub updated: bool,

    /// RFC 3339 timestamp
    pub processed_at: String,
}

/// Totals for a finished batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunSummary {
    /// Candidate rows returned by the fetch
    pub total_rows: usize,

    /// Rows classified and given generated content
    pub processed: usize,

    /// Rows whose write-back succeeded
    pub updated: usize,

    /// Rows that failed download or classification
    pub failed: usize,

    /// Backup table created for this run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_table: Option<String>,

    /// Cumulative audit file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_file: Option<PathBuf>,

    /// Number of batches processed
    pub batches: usize,

    /// Wall-clock duration in seconds
    pub elapsed_secs: f64,

    pub dry_run: bool,
}

/// Accuracy for one true category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryAccuracy {
    pub category: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Accuracy of the classifier over a labelled directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
    pub per_category: Vec<CategoryAccuracy>,
}

/// A column from `information_schema.columns`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&RecordId::Int(42)).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&RecordId::Text("sku-9".into())).unwrap(),
            "\"sku-9\""
        );
        let parsed: RecordId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, RecordId::Int(7));
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::Int(3).to_string(), "3");
        assert_eq!(RecordId::Text("a-1".into()).to_string(), "a-1");
    }

    #[test]
    fn test_failed_result() {
        let result = ClassificationResult::failed("https://x/y.jpg", "HTTP 404");
        assert_eq!(result.category, ERROR_CATEGORY);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.accepted);
        assert!(result.is_error());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"error\":\"HTTP 404\""));
    }

    #[test]
    fn test_audit_record_skips_missing_content() {
        let record = AuditRecord {
            record_id: RecordId::Int(1),
            image_url: "https://x/y.jpg".into(),
            content_hash: None,
            classification: ClassificationResult::failed("https://x/y.jpg", "boom"),
            broad_category: None,
            title: None,
            description: None,
            updated: false,
            processed_at: "2024-01-01T00:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"record_id\":1"));
        assert!(!json.contains("title"));
        assert!(!json.contains("broad_category"));
    }
}
