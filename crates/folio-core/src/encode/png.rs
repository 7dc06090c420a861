//! PNG encoding for extracted crops.
//!
//! PNG keeps the crop lossless and preserves transparency, which is what
//! the cropper uploads by default.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::{check_buffer, EncodeError};
use crate::decode::RasterImage;

/// Encode an RGBA buffer to PNG bytes.
pub fn encode_png(buffer: &RasterImage) -> Result<Vec<u8>, EncodeError> {
    check_buffer(buffer)?;

    let mut out = Cursor::new(Vec::new());
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive);
    encoder
        .write_image(&buffer.pixels, buffer.width, buffer.height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_signature() {
        let buffer = RasterImage::new(10, 10, vec![128u8; 10 * 10 * 4]);
        let png = encode_png(&buffer).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_lossless_round_trip() {
        let pixels: Vec<u8> = (0..(7 * 5 * 4)).map(|i| (i * 37 % 256) as u8).collect();
        let buffer = RasterImage::new(7, 5, pixels);
        let png = encode_png(&buffer).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (7, 5));
        assert_eq!(decoded.into_raw(), buffer.pixels);
    }

    #[test]
    fn test_encode_png_invalid_pixel_data() {
        let buffer = RasterImage {
            width: 10,
            height: 10,
            pixels: vec![0u8; 10],
        };
        assert!(matches!(
            encode_png(&buffer),
            Err(EncodeError::InvalidPixelData { expected: 400, actual: 10 })
        ));
    }

    #[test]
    fn test_encode_png_zero_height() {
        let buffer = RasterImage {
            width: 10,
            height: 0,
            pixels: vec![],
        };
        assert!(matches!(
            encode_png(&buffer),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }
}
