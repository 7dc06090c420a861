//! JPEG encoding for extracted crops.
//!
//! JPEG has no alpha channel, so transparent pixels are composited over
//! white before encoding, the way a canvas exports them.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{check_buffer, EncodeError};
use crate::decode::{RasterImage, CHANNELS};

/// Encode an RGBA buffer to JPEG bytes.
///
/// # Arguments
///
/// * `buffer` - RGBA pixel buffer
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
pub fn encode_jpeg(buffer: &RasterImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    check_buffer(buffer)?;

    let quality = quality.clamp(1, 100);
    let rgb = flatten_alpha(&buffer.pixels);

    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(&rgb, buffer.width, buffer.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(out.into_inner())
}

/// Composite RGBA over white into packed RGB.
fn flatten_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / CHANNELS * 3);
    for px in rgba.chunks_exact(CHANNELS) {
        let alpha = px[3] as u32;
        for &c in &px[..3] {
            let blended = (c as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            rgb.push(blended as u8);
        }
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Encoding always produces valid JPEG when given valid input.
        #[test]
        fn prop_valid_input_produces_valid_jpeg(
            (width, height) in (1u32..=40, 1u32..=40),
            quality in 1u8..=100,
        ) {
            let buffer = RasterImage::new(width, height, vec![200u8; (width * height * 4) as usize]);
            let jpeg = encode_jpeg(&buffer, quality);
            prop_assert!(jpeg.is_ok());

            let jpeg = jpeg.unwrap();
            prop_assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
        }

        /// Property: Mismatched pixel data always returns an error.
        #[test]
        fn prop_invalid_pixel_length_returns_error(
            (width, height) in (1u32..=20, 1u32..=20),
            delta in 1usize..=10,
        ) {
            let expected = (width * height * 4) as usize;
            let buffer = RasterImage { width, height, pixels: vec![0u8; expected + delta] };
            prop_assert!(
                matches!(encode_jpeg(&buffer, 90), Err(EncodeError::InvalidPixelData { .. })),
                "Mismatched pixel data should return InvalidPixelData"
            );
        }
    }
}
