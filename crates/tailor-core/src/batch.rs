//! The batch run: catalogue rows in, titles and descriptions out.
//!
//! ```text
//! backup → fetch candidates → per batch { download → classify → normalize
//!        → generate → write back → audit } → final audit file
//! ```
//!
//! Rows are handled one at a time. Failures on a single row are logged and
//! recorded in the audit trail; they never stop the run.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;

use crate::classify::Classifier;
use crate::config::Config;
use crate::content::ContentGenerator;
use crate::db::{backup_table_name, CatalogStore, CatalogTable};
use crate::error::Result;
use crate::output::AuditWriter;
use crate::pipeline::ImageFetcher;
use crate::taxonomy;
use crate::types::{AuditRecord, CandidateRow, ClassificationResult, RunSummary};

/// Knobs for a run, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub batch_size: usize,
    pub top_k: usize,
    pub backup: bool,
    pub dry_run: bool,
    pub output_dir: PathBuf,
    pub pretty: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.processing.batch_size,
            top_k: config.classification.top_k,
            backup: config.processing.backup_table,
            dry_run: config.processing.dry_run,
            output_dir: config.output_dir(),
            pretty: config.output.pretty,
        }
    }
}

/// Progress notifications for a caller-supplied observer.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent {
    /// Candidate rows were fetched.
    Fetched { total: usize },
    /// A batch is starting (1-based).
    BatchStarted { batch: usize, batches: usize },
    /// One row finished, successfully or not.
    RowFinished { ok: bool },
}

type Observer = Box<dyn Fn(RunEvent) + Send + Sync>;

/// What happened to one row.
enum RowOutcome {
    Failed,
    Processed { updated: bool },
}

/// Drives one run against a catalogue.
pub struct BatchRunner<'a> {
    catalog: &'a dyn CatalogStore,
    fetcher: &'a dyn ImageFetcher,
    classifier: &'a Classifier,
    generator: ContentGenerator,
    table: CatalogTable,
    options: RunOptions,
    observer: Option<Observer>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        catalog: &'a dyn CatalogStore,
        fetcher: &'a dyn ImageFetcher,
        classifier: &'a Classifier,
        generator: ContentGenerator,
        table: CatalogTable,
        options: RunOptions,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            classifier,
            generator,
            table,
            options,
            observer: None,
        }
    }

    /// Receive [`RunEvent`]s as the run progresses.
    pub fn with_observer(mut self, observer: impl Fn(RunEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Execute the run.
    ///
    /// Only a failed candidate fetch or an unwritable audit file is fatal.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let start = Instant::now();
        let started_at = Local::now();
        let mut summary = RunSummary {
            dry_run: self.options.dry_run,
            ..RunSummary::default()
        };

        tracing::info!("Starting classification run");
        tracing::info!("Table: {}", self.table.table);
        tracing::info!("Image column: {}", self.table.image_column);
        tracing::info!("ID column: {}", self.table.id_column);
        tracing::info!(
            "Filter: {}",
            self.table.filter.as_deref().unwrap_or("None")
        );
        if self.options.dry_run {
            tracing::info!("Dry run: no backup, no write-back");
        }

        if self.options.backup && !self.options.dry_run {
            summary.backup_table = self.create_backup(&started_at).await;
        }

        let candidates = self.catalog.fetch_candidates(&self.table).await?;
        summary.total_rows = candidates.len();
        tracing::info!("Found {} images to process", candidates.len());
        self.notify(RunEvent::Fetched {
            total: candidates.len(),
        });

        let mut audit = AuditWriter::new(&self.options.output_dir, &started_at, self.options.pretty);
        let batch_size = self.options.batch_size.max(1);
        let batches = candidates.len().div_ceil(batch_size);

        for (index, batch) in candidates.chunks(batch_size).enumerate() {
            let number = index + 1;
            tracing::info!("Processing batch {}/{}", number, batches);
            self.notify(RunEvent::BatchStarted {
                batch: number,
                batches,
            });

            let mut records = Vec::with_capacity(batch.len());
            for row in batch {
                let (outcome, record) = self.process_row(row).await;
                match outcome {
                    RowOutcome::Failed => summary.failed += 1,
                    RowOutcome::Processed { updated } => {
                        summary.processed += 1;
                        if updated {
                            summary.updated += 1;
                        }
                    }
                }
                self.notify(RunEvent::RowFinished {
                    ok: !matches!(outcome, RowOutcome::Failed),
                });
                records.push(record);
            }

            audit.write_batch(number, records)?;
            summary.batches += 1;
        }

        summary.results_file = Some(audit.finish()?);
        summary.elapsed_secs = start.elapsed().as_secs_f64();

        tracing::info!("Classification complete");
        tracing::info!("Total images: {}", summary.total_rows);
        tracing::info!("Processed: {}", summary.processed);
        tracing::info!("Updated: {}", summary.updated);
        if let Some(backup) = &summary.backup_table {
            tracing::info!("Backup table: {}", backup);
        }
        Ok(summary)
    }

    async fn create_backup(&self, started_at: &chrono::DateTime<Local>) -> Option<String> {
        let backup = match backup_table_name(&self.table.table, started_at) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Skipping backup: {}", e);
                return None;
            }
        };
        match self.catalog.create_backup(&self.table.table, &backup).await {
            Ok(()) => {
                tracing::info!("Created backup table: {}", backup);
                Some(backup.to_string())
            }
            Err(e) => {
                tracing::warn!("Backup failed, continuing without one: {}", e);
                None
            }
        }
    }

    async fn process_row(&mut self, row: &CandidateRow) -> (RowOutcome, AuditRecord) {
        tracing::info!("Processing record {}: {}", row.id, row.image_url);
        let mut record = AuditRecord {
            record_id: row.id.clone(),
            image_url: row.image_url.clone(),
            content_hash: None,
            classification: ClassificationResult::failed(&row.image_url, "not processed"),
            broad_category: None,
            title: None,
            description: None,
            updated: false,
            processed_at: String::new(),
        };

        let downloaded = match self.fetcher.fetch(&row.image_url).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Failed to download image for record {}: {}", row.id, e);
                record.classification = ClassificationResult::failed(&row.image_url, e);
                return (RowOutcome::Failed, stamp(record));
            }
        };
        let bytes = match downloaded.read().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Failed to read download for record {}: {}", row.id, e);
                record.classification = ClassificationResult::failed(&row.image_url, e);
                return (RowOutcome::Failed, stamp(record));
            }
        };
        record.content_hash = Some(blake3::hash(&bytes).to_hex().to_string());

        let result = self
            .classifier
            .classify_bytes(&row.image_url, bytes, downloaded.path(), self.options.top_k)
            .await;
        if result.is_error() {
            tracing::warn!("Failed to classify record {}", row.id);
            record.classification = result;
            return (RowOutcome::Failed, stamp(record));
        }

        let broad = taxonomy::normalize(&result.category);
        let content = self.generator.generate(&broad, result.confidence);
        tracing::debug!(
            "Record {}: {} -> {} ({:.3})",
            row.id,
            result.category,
            broad,
            result.confidence
        );

        let updated = if self.options.dry_run {
            false
        } else {
            self.write_back(row, &content.title, &content.description)
                .await
        };

        record.classification = result;
        record.broad_category = Some(broad);
        record.title = Some(content.title);
        record.description = Some(content.description);
        record.updated = updated;
        (RowOutcome::Processed { updated }, stamp(record))
    }

    async fn write_back(&self, row: &CandidateRow, title: &str, description: &str) -> bool {
        match self
            .catalog
            .update_row(&self.table, &row.id, title, description)
            .await
        {
            Ok(0) => {
                tracing::warn!("No row matched record {} on update", row.id);
                false
            }
            Ok(_) => {
                tracing::info!("Updated record {}: {}", row.id, title);
                true
            }
            Err(e) => {
                tracing::error!("Failed to update record {}: {}", row.id, e);
                false
            }
        }
    }

    fn notify(&self, event: RunEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

fn stamp(mut record: AuditRecord) -> AuditRecord {
    record.processed_at = Local::now().to_rfc3339();
    record
}
