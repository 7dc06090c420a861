//! Folio WASM - WebAssembly bindings for the folio crop and upload pipeline
//!
//! This crate exposes folio-core to the admin pages running in the browser.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - Decoding picked files
//! - `crop` - Initial crop placement and crop constraints
//! - `extract` - Rendering a confirmed crop at device resolution
//! - `encode` - PNG/JPEG encoding of the extracted crop
//! - `upload` - Validation, URL formatting and the upload state machine
//!
//! # Usage
//!
//! ```typescript
//! import init, { decode_image, initial_crop, extract_crop, encode_png } from '@folio/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! const crop = initial_crop(image.width, image.height, 1);
//! ```

use wasm_bindgen::prelude::*;

mod crop;
mod decode;
mod encode;
mod extract;
mod types;
mod upload;

// Re-export public types
pub use crop::{constrain_crop, crop_to_pixels, initial_crop, normalize_crop};
pub use decode::{decode_image, image_dimensions};
pub use encode::{encode_image, encode_png};
pub use extract::{device_pixel_ratio, extract_crop};
pub use types::JsRasterImage;
pub use upload::{format_url, validate_file, JsUploadCoordinator};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
