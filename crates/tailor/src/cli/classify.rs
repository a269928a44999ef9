//! The `tailor classify` and `tailor evaluate` commands: work on local files
//! without touching the database.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;
use tailor_core::classify::labelled_samples;
use tailor_core::output::write_items;
use tailor_core::taxonomy;
use tailor_core::{ClassificationResult, Config, ContentGenerator, OutputFormat as CoreOutputFormat};

use super::setup;

/// Arguments for the `classify` command.
#[derive(Args, Debug, Default)]
pub struct ClassifyArgs {
    /// Image file or directory to classify
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Ranked predictions kept per image
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Minimum similarity for a category to be accepted
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Reference image directory (one subdirectory per category)
    #[arg(long)]
    pub reference_dir: Option<PathBuf>,

    /// Also generate the title and description a run would write
    #[arg(long)]
    pub content: bool,

    /// Seed for title and description selection
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the `evaluate` command.
#[derive(Args, Debug, Default)]
pub struct EvaluateArgs {
    /// Directory with one subdirectory of images per true category
    #[arg(required = true)]
    pub dir: PathBuf,

    /// Minimum similarity for a category to be accepted
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Reference image directory (one subdirectory per category)
    #[arg(long)]
    pub reference_dir: Option<PathBuf>,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// A classification with the copy a run would generate for it.
#[derive(Debug, Serialize)]
struct Preview {
    #[serde(flatten)]
    classification: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    broad_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Preview {
    fn new(classification: ClassificationResult, generator: Option<&mut ContentGenerator>) -> Self {
        let mut preview = Self {
            classification,
            broad_category: None,
            title: None,
            description: None,
        };
        if let Some(generator) = generator {
            if !preview.classification.is_error() {
                let broad = taxonomy::normalize(&preview.classification.category);
                let content = generator.generate(&broad, preview.classification.confidence);
                preview.title = Some(content.title);
                preview.description = Some(content.description);
                preview.broad_category = Some(broad);
            }
        }
        preview
    }
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }
    if let Some(threshold) = args.threshold {
        config.classification.threshold = threshold;
    }
    if let Some(top_k) = args.top_k {
        config.classification.top_k = top_k;
    }
    config.check()?;

    let classifier = setup::load_classifier(&config, args.reference_dir.clone()).await?;
    let files = classifier.processor().discover(&args.input);
    if files.is_empty() {
        anyhow::bail!("No supported images found in {:?}", args.input);
    }
    tracing::info!("Classifying {} images", files.len());

    let paths: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
    let results = classifier
        .classify_batch(&paths, config.classification.top_k)
        .await;

    let failed = results.iter().filter(|r| r.is_error()).count();
    let mut generator = args
        .content
        .then(|| ContentGenerator::new(args.seed.or(config.processing.seed)));
    let previews: Vec<Preview> = results
        .into_iter()
        .map(|r| Preview::new(r, generator.as_mut()))
        .collect();

    let format = CoreOutputFormat::from(args.format);
    match &args.output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_items(writer, &previews, format, config.output.pretty)?;
            tracing::info!("Results saved to {:?}", path);
        }
        None => write_items(io::stdout().lock(), &previews, format, config.output.pretty)?,
    }

    if failed > 0 {
        tracing::warn!("{} of {} images failed to classify", failed, previews.len());
    }
    Ok(())
}

/// Execute the evaluate command.
pub async fn evaluate(args: EvaluateArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(threshold) = args.threshold {
        config.classification.threshold = threshold;
    }
    config.check()?;

    let classifier = setup::load_classifier(&config, args.reference_dir.clone()).await?;
    let samples = labelled_samples(&args.dir, classifier.processor())?;
    if samples.is_empty() {
        anyhow::bail!("No labelled images found under {:?}", args.dir);
    }
    tracing::info!("Evaluating {} labelled images", samples.len());

    let report = classifier.evaluate(&samples).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    eprintln!();
    for entry in &report.per_category {
        eprintln!(
            "    {:24} {:>4}/{:<4} {:>6.1}%",
            entry.category,
            entry.correct,
            entry.total,
            entry.accuracy * 100.0
        );
    }
    eprintln!(
        "    Overall accuracy: {:.1}% ({}/{})",
        report.accuracy * 100.0,
        report.correct,
        report.total
    );
    Ok(())
}
