//! The `tailor models` command for managing the embedding model.

use std::path::Path;

use clap::{Args, Subcommand};
use tailor_core::embedding::VISUAL_MODEL_FILENAME;
use tailor_core::{Config, EmbeddingEngine};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the CLIP visual encoder
    Download {
        /// Re-download even if the model is already present
        #[arg(long)]
        force: bool,

        /// Expected BLAKE3 of the model file; the download is rejected on mismatch
        #[arg(long, value_name = "HEX")]
        blake3: Option<String>,
    },

    /// List known models and whether they are installed
    List,

    /// Show model directory path
    Path,
}

/// A downloadable visual encoder.
struct ModelVariant {
    name: &'static str,
    label: &'static str,
    repo: &'static str,
    remote_path: &'static str,
}

const VISION_VARIANTS: &[ModelVariant] = &[ModelVariant {
    name: "clip-vit-base-patch32",
    label: "CLIP ViT-B/32 (224)",
    repo: "Xenova/clip-vit-base-patch32",
    remote_path: "onnx/vision_model.onnx",
}];

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download { force, blake3 } => {
            let Some(variant) = VISION_VARIANTS
                .iter()
                .find(|v| v.name == config.embedding.model)
            else {
                anyhow::bail!(
                    "No download source for model '{}'. Place {} under {} manually.",
                    config.embedding.model,
                    VISUAL_MODEL_FILENAME,
                    config.model_dir().join(&config.embedding.model).display()
                );
            };

            let dest = EmbeddingEngine::model_path(&config.embedding, &config.model_dir());
            if dest.exists() && !force {
                tracing::info!("{} already exists at {:?}", variant.label, dest);
                println!("Model already installed: {}", dest.display());
                return Ok(());
            }
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let url = format!(
                "https://huggingface.co/{}/resolve/main/{}",
                variant.repo, variant.remote_path
            );
            tracing::info!("Downloading {} vision encoder...", variant.label);
            tracing::info!("  Source: {}", url);
            tracing::info!("  Destination: {:?}", dest);

            let client = reqwest::Client::new();
            download_file(&client, &url, &dest).await?;

            let checksum = file_blake3(&dest)?;
            if let Some(expected) = blake3 {
                verify_blake3(&dest, &checksum, &expected)?;
            }

            let file_size = std::fs::metadata(&dest)?.len();
            tracing::info!(
                "  {} complete ({:.1} MB)",
                variant.label,
                file_size as f64 / (1024.0 * 1024.0)
            );
            tracing::info!("  BLAKE3: {}", checksum);
            println!("Model installed: {}", dest.display());
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();
            println!("Models directory: {}\n", model_dir.display());

            for variant in VISION_VARIANTS {
                let path = model_dir.join(variant.name).join(VISUAL_MODEL_FILENAME);
                let status = if path.exists() {
                    "ready"
                } else {
                    "not installed"
                };
                let marker = if variant.name == config.embedding.model {
                    "  (configured)"
                } else {
                    ""
                };
                println!("  - {:30} {:14}{}", variant.name, status, marker);
            }

            if !EmbeddingEngine::model_exists(&config.embedding, &model_dir) {
                println!("\nRun `tailor models download` to install the configured model.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Stream a URL to `dest` via a `.part` file, renamed into place when complete.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let partial = dest.with_extension("onnx.part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

/// BLAKE3 of a file, hex-encoded.
fn file_blake3(path: &Path) -> anyhow::Result<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open {} for hashing: {e}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compare a computed checksum with the expected one.
///
/// On mismatch, removes the file so the next run re-downloads.
fn verify_blake3(path: &Path, actual: &str, expected: &str) -> anyhow::Result<()> {
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        let _ = std::fs::remove_file(path);
        anyhow::bail!(
            "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
             Corrupt file removed, try downloading again.",
            path.display(),
            expected,
            actual
        );
    }
    tracing::debug!("  Checksum verified: {}", actual);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_matches_in_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"hello tailor").unwrap();

        let expected = blake3::hash(b"hello tailor").to_hex().to_string();
        assert_eq!(file_blake3(&path).unwrap(), expected);
        assert!(verify_blake3(&path, &expected, &expected.to_uppercase()).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn wrong_hash_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"hello tailor").unwrap();
        let actual = file_blake3(&path).unwrap();

        let err = verify_blake3(&path, &actual, &"0".repeat(64)).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_cannot_be_hashed() {
        assert!(file_blake3(Path::new("/nonexistent/file.onnx")).is_err());
    }

    #[test]
    fn default_model_has_a_download_source() {
        let config = Config::default();
        assert!(VISION_VARIANTS
            .iter()
            .any(|v| v.name == config.embedding.model));
    }
}
