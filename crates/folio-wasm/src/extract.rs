//! Raster extraction WASM bindings.
//!
//! [`extract_crop`] is the software counterpart of drawing the crop onto a
//! canvas: it maps a crop drawn on the displayed image back onto natural
//! pixels and renders it at device resolution.

use folio_core::extract::{ExtractionRequest, RasterExtractor, SoftwareExtractor};
use folio_core::geometry::{CropRegion, Size};
use wasm_bindgen::prelude::*;

use crate::types::{filter_from_u8, js_error, JsRasterImage};

/// Extract a crop given in displayed pixels.
///
/// # Arguments
///
/// * `image` - Decoded source at natural size
/// * `x`, `y`, `width`, `height` - Crop in pixels of the displayed image
/// * `displayed_width`, `displayed_height` - Rendered size of the image
/// * `device_pixel_ratio` - Usually `window.devicePixelRatio`
/// * `filter` - 0 = Nearest, 1 = Bilinear, 2 = Lanczos3
///
/// The output is `round(width * scaleX * dpr)` × `round(height * scaleY * dpr)`.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn extract_crop(
    image: &JsRasterImage,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    displayed_width: f64,
    displayed_height: f64,
    device_pixel_ratio: f64,
    filter: u8,
) -> Result<JsRasterImage, JsValue> {
    let source = image.to_raster();
    let request = ExtractionRequest::new(
        CropRegion::pixels(x, y, width, height),
        Size::from_pixels(source.width, source.height),
        Size::new(displayed_width, displayed_height),
        device_pixel_ratio,
    )
    .map_err(js_error)?;

    let extractor = SoftwareExtractor::new(filter_from_u8(filter));
    Ok(JsRasterImage::from_raster(extractor.extract(&source, request)))
}

/// The current window's device pixel ratio, 1 outside a browser.
#[wasm_bindgen]
pub fn device_pixel_ratio() -> f64 {
    current_device_pixel_ratio()
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn current_device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn current_device_pixel_ratio() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::decode::RasterImage;

    fn source(width: u32, height: u32) -> JsRasterImage {
        let mut raster = RasterImage::blank(width, height);
        for (i, px) in raster.pixels.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&[(i % 256) as u8, 0, 0, 255]);
        }
        JsRasterImage::from_raster(raster)
    }

    #[test]
    fn test_extract_scales_to_natural_and_dpr() {
        let image = source(200, 100);
        let out = extract_crop(&image, 10.0, 10.0, 40.0, 40.0, 100.0, 50.0, 2.0, 1).unwrap();
        assert_eq!((out.width(), out.height()), (160, 160));
    }

    #[test]
    fn test_extract_identity() {
        let image = source(8, 8);
        let out = extract_crop(&image, 0.0, 0.0, 8.0, 8.0, 8.0, 8.0, 1.0, 2).unwrap();
        assert_eq!(out.pixels(), image.pixels());
    }

    #[test]
    fn test_native_device_pixel_ratio() {
        assert_eq!(device_pixel_ratio(), 1.0);
    }
}
