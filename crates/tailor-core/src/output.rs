//! JSON output: classification results on stdout and the audit trail on disk.
//!
//! A run leaves one `batch_results_<ts>_batch_<n>.json` per batch, written as
//! soon as the batch finishes, plus a cumulative
//! `classification_results_<ts>.json` at the end. All share the run's start
//! timestamp.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::types::AuditRecord;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Serialize `items` to `writer` in the given format.
///
/// JSON Lines output is never pretty-printed.
pub fn write_items<W: Write, T: Serialize>(
    mut writer: W,
    items: &[T],
    format: OutputFormat,
    pretty: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Json if pretty => {
            serde_json::to_writer_pretty(&mut writer, items).map_err(io::Error::other)?;
            writeln!(writer)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, items).map_err(io::Error::other)?;
            writeln!(writer)?;
        }
        OutputFormat::JsonLines => {
            for item in items {
                serde_json::to_writer(&mut writer, item).map_err(io::Error::other)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()
}

/// Writes per-batch and cumulative audit files for one run.
pub struct AuditWriter {
    dir: PathBuf,
    timestamp: String,
    pretty: bool,
    records: Vec<AuditRecord>,
}

impl AuditWriter {
    /// Files are stamped with `started_at` as `YYYYmmdd_HHMMSS`.
    pub fn new(dir: impl Into<PathBuf>, started_at: &DateTime<Local>, pretty: bool) -> Self {
        Self {
            dir: dir.into(),
            timestamp: started_at.format("%Y%m%d_%H%M%S").to_string(),
            pretty,
            records: Vec::new(),
        }
    }

    /// Path of a batch file (batches are numbered from 1).
    pub fn batch_path(&self, batch: usize) -> PathBuf {
        self.dir
            .join(format!("batch_results_{}_batch_{}.json", self.timestamp, batch))
    }

    /// Path of the cumulative file.
    pub fn final_path(&self) -> PathBuf {
        self.dir
            .join(format!("classification_results_{}.json", self.timestamp))
    }

    /// Write one batch's records and remember them for the final file.
    pub fn write_batch(&mut self, batch: usize, records: Vec<AuditRecord>) -> io::Result<PathBuf> {
        let path = self.batch_path(batch);
        self.write_json(&path, &records)?;
        tracing::info!("Batch {} results saved to {:?}", batch, path);
        self.records.extend(records);
        Ok(path)
    }

    /// Write every record seen so far to the cumulative file.
    pub fn finish(&self) -> io::Result<PathBuf> {
        let path = self.final_path();
        self.write_json(&path, &self.records)?;
        tracing::info!("Results saved to {:?}", path);
        Ok(path)
    }

    /// Records written so far, in processing order.
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    fn write_json(&self, path: &Path, records: &[AuditRecord]) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let writer = BufWriter::new(File::create(path)?);
        write_items(writer, records, OutputFormat::Json, self.pretty)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::Serialize;

    use super::*;
    use crate::types::{ClassificationResult, RecordId};

    #[derive(Serialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    fn items() -> Vec<TestItem> {
        vec![
            TestItem {
                name: "a".to_string(),
                value: 1,
            },
            TestItem {
                name: "b".to_string(),
                value: 2,
            },
        ]
    }

    fn record(id: i64) -> AuditRecord {
        AuditRecord {
            record_id: RecordId::Int(id),
            image_url: format!("https://cdn/{id}.jpg"),
            content_hash: None,
            classification: ClassificationResult::failed("x", "boom"),
            broad_category: None,
            title: None,
            description: None,
            updated: false,
            processed_at: "2024-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn test_write_json_array() {
        let mut buffer = Vec::new();
        write_items(&mut buffer, &items(), OutputFormat::Json, false).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.contains("\"name\":\"a\""));
    }

    #[test]
    fn test_write_jsonl() {
        let mut buffer = Vec::new();
        write_items(&mut buffer, &items(), OutputFormat::JsonLines, true).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.trim().lines().count(), 2);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("csv"), None);
    }

    #[test]
    fn test_audit_file_names() {
        let started = Local.with_ymd_and_hms(2024, 5, 1, 9, 3, 0).unwrap();
        let writer = AuditWriter::new("/out", &started, true);
        assert_eq!(
            writer.batch_path(2),
            PathBuf::from("/out/batch_results_20240501_090300_batch_2.json")
        );
        assert_eq!(
            writer.final_path(),
            PathBuf::from("/out/classification_results_20240501_090300.json")
        );
    }

    #[test]
    fn test_batches_accumulate_into_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = AuditWriter::new(dir.path().join("audit"), &Local::now(), true);

        let first = writer.write_batch(1, vec![record(1), record(2)]).unwrap();
        writer.write_batch(2, vec![record(3)]).unwrap();
        let last = writer.finish().unwrap();

        let batch: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(first).unwrap()).unwrap();
        assert_eq!(batch.as_array().unwrap().len(), 2);

        let all: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(last).unwrap()).unwrap();
        let ids: Vec<i64> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["record_id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_run_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::new(dir.path(), &Local::now(), false);
        let path = writer.finish().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap().trim(), "[]");
    }
}
