//! Pure-Rust raster extraction on top of the `image` crate.

use image::imageops;
use serde::{Deserialize, Serialize};

use super::{ExtractionRequest, RasterExtractor};
use crate::decode::{RasterImage, CHANNELS};

/// Resampling filter used when the output size differs from the source rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest neighbor (fastest, blocky).
    Nearest,
    /// Bilinear (fast, slightly soft).
    Bilinear,
    /// Lanczos3 (slowest, sharpest). Matches a canvas with
    /// `imageSmoothingQuality = "high"`.
    #[default]
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            ResampleFilter::Nearest => imageops::FilterType::Nearest,
            ResampleFilter::Bilinear => imageops::FilterType::Triangle,
            ResampleFilter::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Extracts crops by copying the source rect and resampling it when needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareExtractor {
    pub filter: ResampleFilter,
}

impl SoftwareExtractor {
    pub fn new(filter: ResampleFilter) -> Self {
        Self { filter }
    }
}

impl RasterExtractor for SoftwareExtractor {
    fn extract(&self, source: &RasterImage, request: ExtractionRequest) -> RasterImage {
        let (out_w, out_h) = request.output_size();
        let rect = request.source_rect();

        let (left, top, width, height) = pixel_rect(source, rect.x, rect.y, rect.width, rect.height);
        let region = copy_region(source, left, top, width, height);

        if (width, height) == (out_w, out_h) {
            return region;
        }

        match region.as_view() {
            Some(view) => RasterImage::from_rgba_image(imageops::resize(
                &view,
                out_w,
                out_h,
                self.filter.to_image_filter(),
            )),
            // Unreachable for a region produced by copy_region; keep the
            // size contract anyway.
            None => RasterImage::blank(out_w, out_h),
        }
    }
}

/// Round a natural-pixel rect and clamp it inside the source.
///
/// The result always covers at least one pixel of the source.
fn pixel_rect(source: &RasterImage, x: f64, y: f64, w: f64, h: f64) -> (u32, u32, u32, u32) {
    let round = |v: f64| if v.is_finite() { v.round().max(0.0) as u32 } else { 0 };

    let left = round(x).min(source.width.saturating_sub(1));
    let top = round(y).min(source.height.saturating_sub(1));
    let right = left.saturating_add(round(w)).min(source.width);
    let bottom = top.saturating_add(round(h)).min(source.height);

    let width = right.saturating_sub(left).max(1);
    let height = bottom.saturating_sub(top).max(1);
    (left, top, width, height)
}

/// Copy a pixel rect row by row. The rect must lie inside the source.
fn copy_region(source: &RasterImage, left: u32, top: u32, width: u32, height: u32) -> RasterImage {
    if left == 0 && top == 0 && width == source.width && height == source.height {
        return source.clone();
    }

    let src_stride = source.width as usize * CHANNELS;
    let row_len = width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_len * height as usize);

    for y in top..top + height {
        let start = y as usize * src_stride + left as usize * CHANNELS;
        output.extend_from_slice(&source.pixels[start..start + row_len]);
    }

    RasterImage::new(width, height, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CropRegion, Size};

    /// Create a test image where each pixel encodes its position.
    fn test_image(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        RasterImage::new(width, height, pixels)
    }

    fn request(crop: CropRegion, natural: (u32, u32), displayed: (f64, f64), dpr: f64) -> ExtractionRequest {
        ExtractionRequest::new(
            crop,
            Size::from_pixels(natural.0, natural.1),
            Size::new(displayed.0, displayed.1),
            dpr,
        )
        .unwrap()
    }

    #[test]
    fn test_identity_crop_is_exact() {
        let img = test_image(40, 30);
        let req = request(CropRegion::pixels(0.0, 0.0, 40.0, 30.0), (40, 30), (40.0, 30.0), 1.0);
        let out = SoftwareExtractor::default().extract(&img, req);
        assert_eq!(out, img);
    }

    #[test]
    fn test_center_crop_pixels() {
        let img = test_image(10, 10);
        let req = request(CropRegion::pixels(2.0, 2.0, 6.0, 6.0), (10, 10), (10.0, 10.0), 1.0);
        let out = SoftwareExtractor::default().extract(&img, req);

        assert_eq!(out.dimensions(), (6, 6));
        // Value at (2, 2) = 2 * 10 + 2 = 22
        assert_eq!(out.pixels[0], 22);
    }

    #[test]
    fn test_display_scaling_maps_to_natural() {
        let img = test_image(100, 100);
        // Displayed at half size: a 10px crop at (5, 5) covers 20 natural px at (10, 10).
        let req = request(CropRegion::pixels(5.0, 5.0, 10.0, 10.0), (100, 100), (50.0, 50.0), 1.0);
        let out = SoftwareExtractor::default().extract(&img, req);

        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(out.pixels[0], ((10 * 100 + 10) % 256) as u8);
    }

    #[test]
    fn test_device_pixel_ratio_upsamples() {
        let img = test_image(20, 20);
        let req = request(CropRegion::pixels(0.0, 0.0, 10.0, 10.0), (20, 20), (20.0, 20.0), 2.0);
        let out = SoftwareExtractor::new(ResampleFilter::Nearest).extract(&img, req);
        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(out.byte_size(), 20 * 20 * 4);
    }

    #[test]
    fn test_out_of_bounds_request_is_clamped() {
        let img = test_image(10, 10);
        let req = request(CropRegion::pixels(8.0, 8.0, 5.0, 5.0), (10, 10), (10.0, 10.0), 1.0);
        let out = SoftwareExtractor::default().extract(&img, req);
        // Output keeps the requested size; only the 2x2 in-bounds corner is sampled.
        assert_eq!(out.dimensions(), (5, 5));
    }

    #[test]
    fn test_pixel_rect_minimum() {
        let img = test_image(10, 10);
        assert_eq!(pixel_rect(&img, 9.9, 9.9, 0.1, 0.1), (9, 9, 1, 1));
        assert_eq!(pixel_rect(&img, -5.0, -5.0, 3.0, 3.0), (0, 0, 3, 3));
        assert_eq!(pixel_rect(&img, f64::NAN, 0.0, 100.0, 100.0), (0, 0, 10, 10));
    }

    #[test]
    fn test_filter_conversion() {
        assert!(matches!(
            ResampleFilter::Bilinear.to_image_filter(),
            imageops::FilterType::Triangle
        ));
        assert!(matches!(
            ResampleFilter::default().to_image_filter(),
            imageops::FilterType::Lanczos3
        ));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
