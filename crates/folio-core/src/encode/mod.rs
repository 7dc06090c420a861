//! Pixel buffer serialization.
//!
//! This module provides functionality for:
//! - Encoding extracted crops to PNG (lossless, the default upload format)
//! - Encoding to JPEG with configurable quality
//!
//! # Examples
//!
//! ```ignore
//! use folio_core::encode::{serialize, OutputFormat};
//!
//! let bytes = serialize(&buffer, OutputFormat::Png, 100)?;
//! println!("Encoded {} bytes", bytes.len());
//! ```

mod jpeg;
mod png;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{RasterImage, CHANNELS};

pub use self::jpeg::encode_jpeg;
pub use self::png::encode_png;

/// Errors that can occur while serializing a pixel buffer.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Target format for a serialized crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Serialize a pixel buffer to an image byte stream.
///
/// `quality` only affects lossy formats (1-100, clamped).
///
/// # Errors
///
/// Zero-sized or inconsistent buffers and encoder failures are reported as
/// errors; an empty result is never returned as success.
pub fn serialize(buffer: &RasterImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
    match format {
        OutputFormat::Png => encode_png(buffer),
        OutputFormat::Jpeg => encode_jpeg(buffer, quality),
    }
}

/// Validate buffer dimensions against its pixel data.
fn check_buffer(buffer: &RasterImage) -> Result<(), EncodeError> {
    if buffer.width == 0 || buffer.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: buffer.width,
            height: buffer.height,
        });
    }
    let expected = buffer.width as usize * buffer.height as usize * CHANNELS;
    if buffer.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: buffer.pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_dispatch() {
        let buffer = RasterImage::new(4, 4, vec![90u8; 4 * 4 * 4]);
        let png = serialize(&buffer, OutputFormat::Png, 100).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let jpeg = serialize(&buffer, OutputFormat::Jpeg, 80).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_serialize_zero_sized_fails() {
        let buffer = RasterImage {
            width: 0,
            height: 0,
            pixels: vec![],
        };
        for format in [OutputFormat::Png, OutputFormat::Jpeg] {
            assert!(matches!(
                serialize(&buffer, format, 90),
                Err(EncodeError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_output_format_metadata() {
        assert_eq!(OutputFormat::default(), OutputFormat::Png);
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_output_format_serde() {
        let f: OutputFormat = serde_json::from_str("\"jpeg\"").unwrap();
        assert_eq!(f, OutputFormat::Jpeg);
    }
}
