//! Source image decoding with EXIF orientation handling.
//!
//! The picked file can be any raster format the browser would display in an
//! `<img>` tag, so the format is guessed from content rather than from the
//! declared MIME type.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, Orientation, RasterImage};

/// Decode image bytes to RGBA8, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized,
/// `DecodeError::CorruptedFile` if decoding fails, and `DecodeError::Empty`
/// for zero-sized images.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let raster = RasterImage::from_rgba_image(apply_orientation(img, orientation).into_rgba8());
    if raster.is_empty() {
        return Err(DecodeError::Empty {
            width: raster.width,
            height: raster.height,
        });
    }
    Ok(raster)
}

/// Read the natural (display-oriented) dimensions without keeping pixels.
pub fn natural_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    let orientation = extract_orientation(bytes);
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }
    let (w, h) = reader
        .into_dimensions()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if orientation.swaps_dimensions() {
        Ok((h, w))
    } else {
        Ok((w, h))
    }
}

/// Extract EXIF orientation, defaulting to `Normal` when absent.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_png, serialize, OutputFormat};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 7, 255]);
            }
        }
        encode_png(&RasterImage::new(width, height, pixels)).unwrap()
    }

    #[test]
    fn test_decode_png() {
        let img = decode_image(&png_bytes(12, 8)).unwrap();
        assert_eq!(img.dimensions(), (12, 8));
        // Pixel (3, 2) carries its coordinates in R and G
        let idx = (2 * 12 + 3) * 4;
        assert_eq!(&img.pixels[idx..idx + 4], &[3, 2, 7, 255]);
    }

    #[test]
    fn test_decode_jpeg() {
        let raster = RasterImage::new(16, 16, vec![200u8; 16 * 16 * 4]);
        let jpeg = serialize(&raster, OutputFormat::Jpeg, 90).unwrap();
        let img = decode_image(&jpeg).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = png_bytes(10, 10);
        let result = decode_image(&bytes[..bytes.len() / 2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_natural_dimensions() {
        assert_eq!(natural_dimensions(&png_bytes(30, 20)).unwrap(), (30, 20));
    }

    #[test]
    fn test_no_exif_is_normal() {
        assert_eq!(extract_orientation(&png_bytes(2, 2)), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_rotate90_swaps() {
        let img = DynamicImage::new_rgba8(10, 4);
        let rotated = apply_orientation(img, Orientation::Rotate90CW);
        assert_eq!((rotated.width(), rotated.height()), (4, 10));
    }
}
