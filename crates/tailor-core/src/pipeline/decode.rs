//! Image decoding with format detection, dimension limits, and timeout support.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode an image file.
    pub async fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read file: {}", e),
            })?;
        self.decode_from_bytes(bytes, path).await
    }

    /// Decode an image from an in-memory byte buffer with validation and timeout.
    ///
    /// `path` names the source for error messages; for downloaded images it is
    /// the scratch file the body was streamed into.
    pub async fn decode_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
    ) -> Result<DecodedImage, PipelineError> {
        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_bytes_sync(bytes, &path_owned)).await
        })
        .await;

        match decode_result {
            Ok(Ok(Ok(decoded))) => {
                if decoded.width > self.limits.max_image_dimension
                    || decoded.height > self.limits.max_image_dimension
                {
                    return Err(PipelineError::ImageTooLarge {
                        path: path.to_path_buf(),
                        width: decoded.width,
                        height: decoded.height,
                        max_dim: self.limits.max_image_dimension,
                    });
                }
                Ok(decoded)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    ///
    /// Format is detected from content first; the extension is only a fallback
    /// because scratch files for downloads always carry `.jpg`.
    fn decode_bytes_sync(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, PipelineError> {
        use std::io::Cursor;

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?,
        };
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decode_png_bytes() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder
            .decode_from_bytes(png_bytes(8, 6, [10, 20, 30]), Path::new("mem.png"))
            .await
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!((decoded.width, decoded.height), (8, 6));
    }

    #[tokio::test]
    async fn test_format_detected_by_content_not_extension() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder
            .decode_from_bytes(png_bytes(4, 4, [0, 0, 0]), Path::new("scratch.jpg"))
            .await
            .unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_dimension_limit() {
        let limits = LimitsConfig {
            max_image_dimension: 5,
            ..LimitsConfig::default()
        };
        let decoder = ImageDecoder::new(limits);
        let err = decoder
            .decode_from_bytes(png_bytes(6, 2, [0, 0, 0]), Path::new("wide.png"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::ImageTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_bytes_fail() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let mut bytes = png_bytes(4, 4, [0, 0, 0]);
        bytes.truncate(20);
        assert!(decoder
            .decode_from_bytes(bytes, Path::new("broken.png"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_decode_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, png_bytes(3, 3, [1, 2, 3])).unwrap();
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let decoded = decoder.decode(&path).await.unwrap();
        assert_eq!(decoded.width, 3);
    }
}
