//! Cheap checks before an image is decoded.
//!
//! Downloaded catalogue images frequently turn out to be HTML error pages or
//! truncated bodies served with a 200, so the header is sniffed before the
//! decoder gets involved.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Number of header bytes needed to recognise every supported format.
const HEADER_LEN: usize = 12;

/// Validates image files and buffers before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Maximum accepted size in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.limits.max_file_size_mb * 1024 * 1024
    }

    /// Check that a file exists, is within the size limit, and looks like an image.
    pub fn validate_file(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;
        self.check_size(metadata.len(), path)?;

        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;
        let mut header = [0u8; HEADER_LEN];
        let bytes_read = file.read(&mut header).unwrap_or(0);
        self.check_header(&header[..bytes_read], path)
    }

    /// Check an in-memory buffer (a downloaded body).
    pub fn validate_bytes(&self, bytes: &[u8], path: &Path) -> Result<(), PipelineError> {
        self.check_size(bytes.len() as u64, path)?;
        self.check_header(bytes, path)
    }

    fn check_size(&self, len: u64, path: &Path) -> Result<(), PipelineError> {
        if len > self.max_bytes() {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: len / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    fn check_header(&self, bytes: &[u8], path: &Path) -> Result<(), PipelineError> {
        if bytes.len() < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        if sniff_format(bytes).is_none() {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }
}

/// Identify an image format from its leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("png"),
        [b'G', b'I', b'F', b'8', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        // Truncated RIFF header: let the decoder decide.
        [b'R', b'I', b'F', b'F', rest @ ..] if rest.len() < 8 => Some("webp"),
        [b'B', b'M', ..] => Some("bmp"),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some("tiff"),
        [_, _, _, _, b'f', b't', b'y', b'p', _, _, _, _, ..] => Some("avif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_jpeg_png_webp() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Some("jpeg"));
        assert_eq!(
            sniff_format(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("png")
        );
        assert_eq!(
            sniff_format(&[b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P']),
            Some("webp")
        );
    }

    #[test]
    fn test_sniff_rejects_riff_that_is_not_webp() {
        assert_eq!(
            sniff_format(&[b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'A', b'V', b'E']),
            None
        );
    }

    #[test]
    fn test_sniff_tiff_needs_version() {
        assert_eq!(sniff_format(&[b'I', b'I', 0x2A, 0x00]), Some("tiff"));
        assert_eq!(sniff_format(&[b'M', b'M', 0x00, 0x2A]), Some("tiff"));
        assert_eq!(sniff_format(&[b'I', b'I', 0x00, 0x00]), None);
    }

    #[test]
    fn test_html_body_rejected() {
        let validator = Validator::new(LimitsConfig::default());
        let err = validator
            .validate_bytes(b"<!DOCTYPE html><html>", Path::new("row-7"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid magic bytes"));
    }

    #[test]
    fn test_oversized_buffer_rejected() {
        let limits = LimitsConfig {
            max_file_size_mb: 1,
            ..LimitsConfig::default()
        };
        let validator = Validator::new(limits);
        let mut bytes = vec![0u8; 2 * 1024 * 1024];
        bytes[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        let err = validator
            .validate_bytes(&bytes, Path::new("big.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_missing_file() {
        let validator = Validator::new(LimitsConfig::default());
        let err = validator
            .validate_file(Path::new("/definitely/not/here.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }
}
