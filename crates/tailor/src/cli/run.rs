//! The `tailor run` command: classify catalogue rows and write copy back.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tailor_core::{
    BatchRunner, CatalogStore, CatalogTable, Config, ContentGenerator, HttpFetcher, PgSession,
    RunEvent, RunOptions, RunSummary,
};

use super::setup::{self, CatalogArgs, DatabaseArgs};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Rows per batch (one audit file per batch)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Minimum similarity for a category to be accepted
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Ranked predictions kept per image
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Skip the backup table
    #[arg(long)]
    pub no_backup: bool,

    /// Classify and audit without writing to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Seed for title and description selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for audit files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Reference image directory (one subdirectory per category)
    #[arg(long)]
    pub reference_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        self.database.apply(&mut config.database);
        self.catalog.apply(&mut config.catalog);

        if let Some(batch_size) = self.batch_size {
            config.processing.batch_size = batch_size;
        }
        if let Some(threshold) = self.threshold {
            config.classification.threshold = threshold;
        }
        if let Some(top_k) = self.top_k {
            config.classification.top_k = top_k;
        }
        if self.no_backup {
            config.processing.backup_table = false;
        }
        if self.dry_run {
            config.processing.dry_run = true;
        }
        if self.seed.is_some() {
            config.processing.seed = self.seed;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(dir) = &self.reference_dir {
            config.general.reference_dir = dir.clone();
        }
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.check()?;

    let table = CatalogTable::from_config(&config.catalog)?;
    let classifier = setup::load_classifier(&config, None).await?;
    let fetcher = HttpFetcher::new(&config.limits)?;
    let generator = ContentGenerator::new(config.processing.seed);
    let options = RunOptions::from_config(&config);

    let db = &config.database;
    let session = PgSession::connect(db)
        .await
        .with_context(|| format!("Cannot connect to {}:{}/{}", db.host, db.port, db.name))?;
    match session.server_version().await {
        Ok(version) => tracing::info!("Connected: {}", version),
        Err(e) => tracing::warn!("Could not read server version: {}", e),
    }

    let pb = create_progress_bar()?;
    let result = {
        let progress = pb.clone();
        let mut runner = BatchRunner::new(&session, &fetcher, &classifier, generator, table, options)
            .with_observer(move |event| match event {
                RunEvent::Fetched { total } => progress.set_length(total as u64),
                RunEvent::BatchStarted { batch, batches } => {
                    progress.set_message(format!("batch {batch}/{batches}"))
                }
                RunEvent::RowFinished { .. } => progress.inc(1),
            });
        runner.run().await
    };
    session.close().await;

    let summary = match result {
        Ok(summary) => {
            pb.finish_with_message("done");
            summary
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e.into());
        }
    };

    print_summary(&summary);
    Ok(())
}

/// Create a progress bar whose length is set once candidates are fetched.
fn create_progress_bar() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("fetching rows...");
    Ok(pb)
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &RunSummary) {
    let rate = if summary.elapsed_secs > 0.0 {
        summary.processed as f64 / summary.elapsed_secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Rows:         {:>8}", summary.total_rows);
    eprintln!("    Processed:    {:>8}", summary.processed);
    eprintln!("    Updated:      {:>8}", summary.updated);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Batches:      {:>8}", summary.batches);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed_secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
    if let Some(backup) = &summary.backup_table {
        eprintln!("    Backup table: {}", backup);
    }
    if let Some(path) = &summary.results_file {
        eprintln!("    Results:      {}", path.display());
    }
    if summary.dry_run {
        eprintln!("    Dry run: no rows were written");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(argv: &[&str]) -> RunArgs {
        Harness::try_parse_from(std::iter::once("tailor").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let mut config = Config::default();
        parse(&[]).apply(&mut config);
        assert!(config.processing.backup_table);
        assert!(!config.processing.dry_run);
        assert_eq!(config.processing.batch_size, 10);
        assert!(config.processing.seed.is_none());
    }

    #[test]
    fn flags_override_config() {
        let mut config = Config::default();
        parse(&[
            "--table",
            "shop.garments",
            "--filter",
            "garment_title IS NULL",
            "--max-rows",
            "50",
            "--batch-size",
            "5",
            "--threshold",
            "0.4",
            "--no-backup",
            "--dry-run",
            "--seed",
            "7",
            "--output-dir",
            "/tmp/audit",
        ])
        .apply(&mut config);

        assert_eq!(config.catalog.table, "shop.garments");
        assert_eq!(config.catalog.filter.as_deref(), Some("garment_title IS NULL"));
        assert_eq!(config.catalog.max_rows, Some(50));
        assert_eq!(config.processing.batch_size, 5);
        assert!((config.classification.threshold - 0.4).abs() < f32::EPSILON);
        assert!(!config.processing.backup_table);
        assert!(config.processing.dry_run);
        assert_eq!(config.processing.seed, Some(7));
        assert_eq!(config.output.dir, PathBuf::from("/tmp/audit"));
        assert!(config.check().is_ok());
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let mut config = Config::default();
        parse(&["--threshold", "1.5"]).apply(&mut config);
        assert!(config.check().is_err());
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let mut config = Config::default();
        parse(&["--batch-size", "0"]).apply(&mut config);
        assert!(config.check().is_err());
    }

    #[test]
    fn progress_bar_template_is_valid() {
        assert!(create_progress_bar().is_ok());
    }
}
