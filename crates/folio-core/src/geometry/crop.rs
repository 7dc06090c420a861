//! Initial crop placement and crop constraints.
//!
//! All functions here always return a rectangle inside the image. When a
//! constraint cannot be satisfied (a source smaller than the configured
//! minimum, say) the region falls back to the largest rectangle that fits
//! instead of failing.

use serde::{Deserialize, Serialize};

use super::region::{CropRegion, Size};

/// Share of the image width the initial crop covers.
pub const INITIAL_WIDTH_PERCENT: f64 = 90.0;

/// Constraints the crop overlay enforces while the user drags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropConstraints {
    /// Width over height; `None` lets the user pick any rectangle.
    pub aspect_ratio: Option<f64>,
    /// Minimum crop width in pixels of the measured image.
    pub min_width: f64,
    /// Minimum crop height in pixels of the measured image.
    pub min_height: f64,
}

impl Default for CropConstraints {
    fn default() -> Self {
        Self {
            aspect_ratio: Some(1.0),
            min_width: 200.0,
            min_height: 200.0,
        }
    }
}

impl CropConstraints {
    /// Initial crop with minimums applied, in percent units.
    pub fn initial(&self, width: f64, height: f64) -> CropRegion {
        let size = Size::new(width, height);
        let region = initial_crop(width, height, self.aspect_ratio);
        self.apply(region, size)
    }

    /// Bring a user-adjusted region back inside every constraint.
    ///
    /// The result keeps the unit of `region`.
    pub fn apply(&self, region: CropRegion, size: Size) -> CropRegion {
        let normalized = normalize_for_aspect(region, self.aspect_ratio, size);
        constrain(
            normalized,
            size,
            self.min_width,
            self.min_height,
            self.aspect_ratio,
        )
    }
}

/// Compute the crop shown when the image first loads.
///
/// The region is 90% of the image width with the height derived from
/// `aspect_ratio`. When that height does not fit, the region is scaled down
/// to the full image height at the same ratio. The region is centered on
/// both axes. Free-form crops start at 90% of both sides.
///
/// Returned in percent units, so it can be applied to the displayed image
/// regardless of its CSS size.
pub fn initial_crop(natural_width: f64, natural_height: f64, aspect_ratio: Option<f64>) -> CropRegion {
    let size = Size::new(natural_width, natural_height);
    if size.is_degenerate() {
        return CropRegion::percent(0.0, 0.0, 0.0, 0.0);
    }

    let mut width = natural_width * INITIAL_WIDTH_PERCENT / 100.0;
    let mut height = match valid_ratio(aspect_ratio) {
        Some(ratio) => width / ratio,
        None => natural_height * INITIAL_WIDTH_PERCENT / 100.0,
    };

    if height > natural_height {
        if let Some(ratio) = valid_ratio(aspect_ratio) {
            height = natural_height;
            width = height * ratio;
        } else {
            height = natural_height;
        }
    }
    // A very wide ratio can still overflow horizontally after the rescale.
    if width > natural_width {
        width = natural_width;
        if let Some(ratio) = valid_ratio(aspect_ratio) {
            height = width / ratio;
        }
    }

    CropRegion::centered(width, height, size)
        .clamp_within(size)
        .to_percent(size)
}

/// Adjust `region` so its pixel size matches `aspect_ratio`.
///
/// The width is kept and the height derived from it. If the derived height
/// does not fit the image, the height takes all available space and the width
/// is derived from it instead. The region is then clamped into the image.
/// A `None` ratio only clamps.
pub fn normalize_for_aspect(region: CropRegion, aspect_ratio: Option<f64>, size: Size) -> CropRegion {
    let unit = region.unit;
    let mut px = region.to_pixels(size);

    if let Some(ratio) = valid_ratio(aspect_ratio) {
        px.width = px.width.clamp(0.0, size.width.max(0.0));
        px.height = px.width / ratio;
        if px.height > size.height {
            px.height = size.height;
            px.width = px.height * ratio;
        }
    }

    px.clamp_within(size).to_unit(unit, size)
}

/// Enforce minimum dimensions, clamping to the image when they cannot be met.
///
/// With an aspect ratio, a source too small for the minimum yields the
/// largest centered rectangle at that ratio (the full image when the ratios
/// agree). Free-form regions clamp each side independently.
pub fn constrain(
    region: CropRegion,
    size: Size,
    min_width: f64,
    min_height: f64,
    aspect_ratio: Option<f64>,
) -> CropRegion {
    let unit = region.unit;
    if size.is_degenerate() {
        return region;
    }
    let mut px = region.to_pixels(size);
    let min_width = min_width.max(0.0);
    let min_height = min_height.max(0.0);

    match valid_ratio(aspect_ratio) {
        Some(ratio) => {
            let required = min_width.max(min_height * ratio);
            let fit = size.width.min(size.height * ratio);
            if required > fit {
                let (w, h) = (fit, fit / ratio);
                let centered = CropRegion::centered(w, h, size);
                return centered.clamp_within(size).to_unit(unit, size);
            }
            let width = px.width.clamp(required, fit);
            let height = width / ratio;
            // Grow around the current center so the selection does not jump.
            let cx = px.x + px.width / 2.0;
            let cy = px.y + px.height / 2.0;
            px = CropRegion::pixels(cx - width / 2.0, cy - height / 2.0, width, height);
        }
        None => {
            let width = px.width.max(min_width).min(size.width);
            let height = px.height.max(min_height).min(size.height);
            px.width = width;
            px.height = height;
        }
    }

    px.clamp_within(size).to_unit(unit, size)
}

fn valid_ratio(aspect_ratio: Option<f64>) -> Option<f64> {
    aspect_ratio.filter(|r| r.is_finite() && *r > 0.0)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
