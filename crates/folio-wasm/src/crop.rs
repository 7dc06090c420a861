//! Crop geometry WASM bindings.
//!
//! Regions cross the boundary as plain objects:
//! `{ unit: "%" | "px", x, y, width, height }`.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const crop = initial_crop(img.naturalWidth, img.naturalHeight, 1);
//! // ...user drags...
//! const fixed = constrain_crop(dragged, img.width, img.height, 1, 200, 200);
//! ```

use folio_core::geometry::{self, CropConstraints, CropRegion, Size};
use wasm_bindgen::prelude::*;

use crate::types::js_error;

fn to_js(region: &CropRegion) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(region).map_err(js_error)
}

fn from_js(value: JsValue) -> Result<CropRegion, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid crop region: {}", e)))
}

/// Initial crop in percent units: 90% of the width at `aspect_ratio`,
/// scaled down to fit and centered. Pass `undefined` for free-form.
#[wasm_bindgen]
pub fn initial_crop(width: f64, height: f64, aspect_ratio: Option<f64>) -> Result<JsValue, JsValue> {
    to_js(&geometry::initial_crop(width, height, aspect_ratio))
}

/// Normalize a dragged region to the aspect ratio, enforce minimum
/// dimensions and clamp it into a `width`×`height` image.
///
/// The result keeps the unit of `region`.
#[wasm_bindgen]
pub fn constrain_crop(
    region: JsValue,
    width: f64,
    height: f64,
    aspect_ratio: Option<f64>,
    min_width: f64,
    min_height: f64,
) -> Result<JsValue, JsValue> {
    let region = from_js(region)?;
    to_js(&constrain_region(region, width, height, aspect_ratio, min_width, min_height))
}

/// Fit a region to `aspect_ratio` (keep the width, derive the height) and
/// clamp it into a `width`×`height` image, without minimums.
#[wasm_bindgen]
pub fn normalize_crop(
    region: JsValue,
    width: f64,
    height: f64,
    aspect_ratio: Option<f64>,
) -> Result<JsValue, JsValue> {
    let region = from_js(region)?;
    to_js(&geometry::normalize_for_aspect(region, aspect_ratio, Size::new(width, height)))
}

/// Convert a region to pixels of a `width`×`height` image.
#[wasm_bindgen]
pub fn crop_to_pixels(region: JsValue, width: f64, height: f64) -> Result<JsValue, JsValue> {
    let region = from_js(region)?;
    to_js(&region.to_pixels(Size::new(width, height)))
}

pub(crate) fn constrain_region(
    region: CropRegion,
    width: f64,
    height: f64,
    aspect_ratio: Option<f64>,
    min_width: f64,
    min_height: f64,
) -> CropRegion {
    let constraints = CropConstraints {
        aspect_ratio,
        min_width,
        min_height,
    };
    constraints.apply(region, Size::new(width, height))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_initial_crop_object() {
        let value = initial_crop(1000.0, 800.0, Some(1.0)).unwrap();
        let region: CropRegion = serde_wasm_bindgen::from_value(value).unwrap();
        let px = region.to_pixels(Size::new(1000.0, 800.0));
        assert!((px.width - 800.0).abs() < 1e-6);
        assert!((px.x - 100.0).abs() < 1e-6);
    }

    #[wasm_bindgen_test]
    fn test_constrain_crop_rejects_garbage() {
        let garbage = serde_wasm_bindgen::to_value(&"nope").unwrap();
        assert!(constrain_crop(garbage, 100.0, 100.0, None, 0.0, 0.0).is_err());
    }
}
