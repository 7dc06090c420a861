//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode a picked file into RGBA pixels
//! - [`image_dimensions`] - Read natural dimensions without decoding pixels
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, image_dimensions } from '@folio/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const [width, height] = image_dimensions(bytes);
//! const image = decode_image(bytes);
//! ```

use crate::types::{js_error, JsRasterImage};
use folio_core::decode;
use wasm_bindgen::prelude::*;

/// Decode PNG, JPEG, WebP or GIF bytes to RGBA.
///
/// EXIF orientation is applied, so the result is upright.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsRasterImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsRasterImage::from_raster)
        .map_err(js_error)
}

/// Natural `[width, height]` of an image, after EXIF orientation.
#[wasm_bindgen]
pub fn image_dimensions(bytes: &[u8]) -> Result<Vec<u32>, JsValue> {
    decode::natural_dimensions(bytes)
        .map(|(w, h)| vec![w, h])
        .map_err(js_error)
}
