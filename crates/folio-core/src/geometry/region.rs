//! Crop rectangle types and unit conversion.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing rectangle edges and aspect ratios.
pub const EPSILON: f64 = 1e-6;

/// Width and height of an image, in natural or display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    /// A size is degenerate when either side is zero, negative or NaN.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Units a [`CropRegion`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropUnit {
    /// Percent of the image size (0..=100). Used by the crop overlay so the
    /// selection survives zoom and layout changes.
    #[default]
    #[serde(rename = "%")]
    Percent,
    /// Absolute pixels of the image the region was measured on.
    #[serde(rename = "px")]
    Pixels,
}

/// A rectangle selected for cropping.
///
/// `x`/`y` give the top-left corner. The origin is the top-left corner of the
/// image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub unit: CropUnit,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Pixels,
            x,
            y,
            width,
            height,
        }
    }

    /// The whole image, in pixels.
    pub fn full(size: Size) -> Self {
        Self::pixels(0.0, 0.0, size.width, size.height)
    }

    /// Express this region in pixels of an image of `size`.
    pub fn to_pixels(self, size: Size) -> Self {
        match self.unit {
            CropUnit::Pixels => self,
            CropUnit::Percent => Self::pixels(
                self.x / 100.0 * size.width,
                self.y / 100.0 * size.height,
                self.width / 100.0 * size.width,
                self.height / 100.0 * size.height,
            ),
        }
    }

    /// Express this region in percent of an image of `size`.
    pub fn to_percent(self, size: Size) -> Self {
        match self.unit {
            CropUnit::Percent => self,
            CropUnit::Pixels if size.is_degenerate() => Self::percent(0.0, 0.0, 0.0, 0.0),
            CropUnit::Pixels => Self::percent(
                self.x / size.width * 100.0,
                self.y / size.height * 100.0,
                self.width / size.width * 100.0,
                self.height / size.height * 100.0,
            ),
        }
    }

    /// Convert into the given unit.
    pub fn to_unit(self, unit: CropUnit, size: Size) -> Self {
        match unit {
            CropUnit::Percent => self.to_percent(size),
            CropUnit::Pixels => self.to_pixels(size),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Width over height. Only meaningful for pixel regions or square images.
    pub fn aspect(&self) -> f64 {
        if self.height == 0.0 {
            0.0
        } else {
            self.width / self.height
        }
    }

    /// True when the region has no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Whether the region lies inside an image of `size`, within [`EPSILON`].
    pub fn is_within(&self, size: Size) -> bool {
        let px = self.to_pixels(size);
        px.x >= -EPSILON
            && px.y >= -EPSILON
            && px.right() <= size.width + EPSILON
            && px.bottom() <= size.height + EPSILON
    }

    /// Clamp the region into an image of `size`, keeping its unit.
    ///
    /// Oversized sides shrink to the image size first, then the position is
    /// moved so the whole rectangle fits.
    pub fn clamp_within(self, size: Size) -> Self {
        let unit = self.unit;
        let px = self.to_pixels(size);

        let width = finite_or_zero(px.width).clamp(0.0, size.width.max(0.0));
        let height = finite_or_zero(px.height).clamp(0.0, size.height.max(0.0));
        let x = finite_or_zero(px.x).clamp(0.0, (size.width - width).max(0.0));
        let y = finite_or_zero(px.y).clamp(0.0, (size.height - height).max(0.0));

        Self::pixels(x, y, width, height).to_unit(unit, size)
    }

    /// Center a rectangle of the given pixel size inside `size`.
    pub fn centered(width: f64, height: f64, size: Size) -> Self {
        Self::pixels(
            (size.width - width) / 2.0,
            (size.height - height) / 2.0,
            width,
            height,
        )
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percent_to_pixels() {
        let px = CropRegion::percent(10.0, 0.0, 80.0, 100.0).to_pixels(Size::new(1000.0, 800.0));
        assert_eq!(px.unit, CropUnit::Pixels);
        assert!(approx(px.x, 100.0));
        assert!(approx(px.y, 0.0));
        assert!(approx(px.width, 800.0));
        assert!(approx(px.height, 800.0));
    }

    #[test]
    fn test_pixels_to_percent() {
        let pct = CropRegion::pixels(50.0, 25.0, 100.0, 50.0).to_percent(Size::new(200.0, 100.0));
        assert_eq!(pct.unit, CropUnit::Percent);
        assert!(approx(pct.x, 25.0));
        assert!(approx(pct.y, 25.0));
        assert!(approx(pct.width, 50.0));
        assert!(approx(pct.height, 50.0));
    }

    #[test]
    fn test_to_percent_degenerate_size() {
        let pct = CropRegion::pixels(1.0, 1.0, 1.0, 1.0).to_percent(Size::new(0.0, 10.0));
        assert!(pct.is_degenerate());
    }

    #[test]
    fn test_clamp_moves_region_inside() {
        let size = Size::new(100.0, 100.0);
        let clamped = CropRegion::pixels(80.0, -10.0, 50.0, 50.0).clamp_within(size);
        assert!(approx(clamped.x, 50.0));
        assert!(approx(clamped.y, 0.0));
        assert!(approx(clamped.width, 50.0));
        assert!(clamped.is_within(size));
    }

    #[test]
    fn test_clamp_shrinks_oversized_region() {
        let size = Size::new(100.0, 60.0);
        let clamped = CropRegion::pixels(0.0, 0.0, 500.0, 500.0).clamp_within(size);
        assert_eq!(clamped, CropRegion::full(size));
    }

    #[test]
    fn test_clamp_keeps_percent_unit() {
        let size = Size::new(200.0, 100.0);
        let clamped = CropRegion::percent(90.0, 0.0, 50.0, 50.0).clamp_within(size);
        assert_eq!(clamped.unit, CropUnit::Percent);
        assert!(approx(clamped.x, 50.0));
    }

    #[test]
    fn test_clamp_handles_nan() {
        let size = Size::new(100.0, 100.0);
        let clamped = CropRegion::pixels(f64::NAN, 0.0, 10.0, 10.0).clamp_within(size);
        assert!(approx(clamped.x, 0.0));
    }

    #[test]
    fn test_centered() {
        let r = CropRegion::centered(800.0, 800.0, Size::new(1000.0, 800.0));
        assert!(approx(r.x, 100.0));
        assert!(approx(r.y, 0.0));
    }

    #[test]
    fn test_unit_serde_names() {
        let json = serde_json::to_string(&CropRegion::percent(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert!(json.contains("\"unit\":\"%\""));
        let back: CropRegion =
            serde_json::from_str(r#"{"unit":"px","x":0,"y":0,"width":5,"height":6}"#).unwrap();
        assert_eq!(back.unit, CropUnit::Pixels);
    }
}
