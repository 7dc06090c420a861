//! Image encoding WASM bindings.
//!
//! # Functions
//!
//! - [`encode_png`] - Encode an extracted crop as PNG (the upload format)
//! - [`encode_image`] - Encode as `"png"` or `"jpeg"` with a quality
//!
//! # Example
//!
//! ```typescript
//! const png = encode_png(cropped);
//! const file = new File([png], 'cropped-image.png', { type: 'image/png' });
//! ```

use crate::types::{js_error, JsRasterImage};
use folio_core::encode::{self, OutputFormat};
use wasm_bindgen::prelude::*;

/// Encode an RGBA image as PNG.
#[wasm_bindgen]
pub fn encode_png(image: &JsRasterImage) -> Result<Vec<u8>, JsValue> {
    encode::encode_png(&image.to_raster()).map_err(js_error)
}

/// Encode an RGBA image as `"png"` or `"jpeg"`.
///
/// `quality` (1-100) only affects JPEG; transparency is flattened onto white.
#[wasm_bindgen]
pub fn encode_image(image: &JsRasterImage, format: &str, quality: u8) -> Result<Vec<u8>, JsValue> {
    let format = parse_format(format).ok_or_else(|| JsValue::from_str(&format!("Unsupported format: {}", format)))?;
    encode::serialize(&image.to_raster(), format, quality).map_err(js_error)
}

pub(crate) fn parse_format(format: &str) -> Option<OutputFormat> {
    match format.to_ascii_lowercase().as_str() {
        "png" | "image/png" => Some(OutputFormat::Png),
        "jpeg" | "jpg" | "image/jpeg" => Some(OutputFormat::Jpeg),
        _ => None,
    }
}
