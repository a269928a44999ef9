//! Downloading catalogue images to scratch files.
//!
//! Every failure here is per-row: the orchestrator logs it and moves on.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// A downloaded image living in a scratch file.
///
/// The file is removed when this value is dropped.
pub struct DownloadedImage {
    file: NamedTempFile,
    size: u64,
}

impl DownloadedImage {
    /// Write an in-memory body to a fresh scratch file.
    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = scratch_file()?;
        std::io::Write::write_all(&mut file, bytes)?;
        Ok(Self {
            file,
            size: bytes.len() as u64,
        })
    }

    /// Path of the scratch file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Body size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole body back.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}

/// Source of catalogue images.
///
/// Uses `async_trait` so the orchestrator can hold a `Box<dyn ImageFetcher>`.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download `url` into a scratch file.
    async fn fetch(&self, url: &str) -> Result<DownloadedImage, PipelineError>;
}

/// Plain HTTP(S) GET with a bounded timeout and a streamed body.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
    timeout_ms: u64,
}

impl HttpFetcher {
    /// Build a fetcher from the configured limits.
    pub fn new(limits: &LimitsConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(limits.download_timeout_ms))
            .user_agent(concat!("tailor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Model {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            max_bytes: limits.max_file_size_mb * 1024 * 1024,
            timeout_ms: limits.download_timeout_ms,
        })
    }

    fn download_error(&self, url: &str, err: reqwest::Error) -> PipelineError {
        if err.is_timeout() {
            return PipelineError::Timeout {
                path: url.into(),
                stage: "download".to_string(),
                timeout_ms: self.timeout_ms,
            };
        }
        PipelineError::Download {
            url: url.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<DownloadedImage, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.download_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Download {
                url: url.to_string(),
                message: format!("HTTP {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(PipelineError::FileTooLarge {
                    path: url.into(),
                    size_mb: len / (1024 * 1024),
                    max_mb: self.max_bytes / (1024 * 1024),
                });
            }
        }

        let io_err = |e: std::io::Error| PipelineError::Download {
            url: url.to_string(),
            message: format!("Scratch file error: {e}"),
            status_code: None,
        };

        let file = scratch_file().map_err(io_err)?;
        let mut out = tokio::fs::File::from_std(file.reopen().map_err(io_err)?);
        let mut stream = response.bytes_stream();
        let mut size: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.download_error(url, e))?;
            size += chunk.len() as u64;
            if size > self.max_bytes {
                return Err(PipelineError::FileTooLarge {
                    path: url.into(),
                    size_mb: size / (1024 * 1024),
                    max_mb: self.max_bytes / (1024 * 1024),
                });
            }
            out.write_all(&chunk).await.map_err(io_err)?;
        }
        out.flush().await.map_err(io_err)?;

        tracing::debug!("Downloaded {} ({} bytes) to {:?}", url, size, file.path());
        Ok(DownloadedImage { file, size })
    }
}

fn scratch_file() -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("tailor-")
        .suffix(".jpg")
        .tempfile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_downloaded_image_roundtrip_and_cleanup() {
        let image = DownloadedImage::from_bytes(b"\xFF\xD8\xFFpayload").unwrap();
        let path = image.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(image.size(), 10);
        assert_eq!(image.read().await.unwrap(), b"\xFF\xD8\xFFpayload");
        assert!(path.extension().is_some_and(|e| e == "jpg"));

        drop(image);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_soft_error() {
        let limits = LimitsConfig {
            download_timeout_ms: 2000,
            ..LimitsConfig::default()
        };
        let fetcher = HttpFetcher::new(&limits).unwrap();
        // Port 9 on localhost is almost never listening.
        let result = fetcher.fetch("http://127.0.0.1:9/none.jpg").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_url_is_soft_error() {
        let fetcher = HttpFetcher::new(&LimitsConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(PipelineError::Download { .. })
        ));
    }
}
