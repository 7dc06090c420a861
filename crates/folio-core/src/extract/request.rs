//! Extraction requests: a confirmed crop plus the scale it was drawn at.

use thiserror::Error;

use crate::geometry::{CropRegion, Size};

/// Errors raised when building an [`ExtractionRequest`].
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    /// The crop, the displayed size or the natural size has no area.
    #[error("Degenerate extraction request: {0}")]
    Degenerate(&'static str),

    /// Device pixel ratio must be a positive finite number.
    #[error("Invalid device pixel ratio: {0}")]
    InvalidPixelRatio(f64),
}

/// A read-only snapshot of a confirmed crop.
///
/// The crop is held in pixels of the *displayed* image (what the user drew
/// on); the scale factors map it onto the natural pixels of the source.
/// Built once when the user confirms and consumed by value by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    crop: CropRegion,
    natural: Size,
    displayed: Size,
    device_pixel_ratio: f64,
}

impl ExtractionRequest {
    /// Build a request from a crop measured on the displayed image.
    ///
    /// `crop` may be in either unit; percent crops are resolved against
    /// `displayed`.
    pub fn new(
        crop: CropRegion,
        natural: Size,
        displayed: Size,
        device_pixel_ratio: f64,
    ) -> Result<Self, ExtractError> {
        if natural.is_degenerate() {
            return Err(ExtractError::Degenerate("natural size"));
        }
        if displayed.is_degenerate() {
            return Err(ExtractError::Degenerate("displayed size"));
        }
        if !(device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0) {
            return Err(ExtractError::InvalidPixelRatio(device_pixel_ratio));
        }
        let crop = crop.to_pixels(displayed);
        if crop.is_degenerate() {
            return Err(ExtractError::Degenerate("crop region"));
        }
        Ok(Self {
            crop,
            natural,
            displayed,
            device_pixel_ratio,
        })
    }

    /// Crop in displayed pixels.
    pub fn crop(&self) -> CropRegion {
        self.crop
    }

    pub fn natural(&self) -> Size {
        self.natural
    }

    pub fn displayed(&self) -> Size {
        self.displayed
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Natural pixels per displayed pixel, horizontally.
    pub fn scale_x(&self) -> f64 {
        self.natural.width / self.displayed.width
    }

    /// Natural pixels per displayed pixel, vertically.
    pub fn scale_y(&self) -> f64 {
        self.natural.height / self.displayed.height
    }

    /// The crop mapped onto natural pixels.
    pub fn source_rect(&self) -> CropRegion {
        CropRegion::pixels(
            self.crop.x * self.scale_x(),
            self.crop.y * self.scale_y(),
            self.crop.width * self.scale_x(),
            self.crop.height * self.scale_y(),
        )
    }

    /// Output buffer size: source rect times the device pixel ratio, rounded,
    /// never below one pixel.
    pub fn output_size(&self) -> (u32, u32) {
        let rect = self.source_rect();
        let w = (rect.width * self.device_pixel_ratio).round();
        let h = (rect.height * self.device_pixel_ratio).round();
        (to_dimension(w), to_dimension(h))
    }
}

fn to_dimension(v: f64) -> u32 {
    if v.is_finite() {
        (v as u32).max(1)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factors() {
        let req = ExtractionRequest::new(
            CropRegion::pixels(10.0, 20.0, 100.0, 50.0),
            Size::new(2000.0, 1000.0),
            Size::new(500.0, 250.0),
            1.0,
        )
        .unwrap();
        assert_eq!(req.scale_x(), 4.0);
        assert_eq!(req.scale_y(), 4.0);
        assert_eq!(req.source_rect(), CropRegion::pixels(40.0, 80.0, 400.0, 200.0));
        assert_eq!(req.output_size(), (400, 200));
    }

    #[test]
    fn test_device_pixel_ratio_scales_output() {
        let req = ExtractionRequest::new(
            CropRegion::pixels(0.0, 0.0, 800.0, 800.0),
            Size::new(1000.0, 800.0),
            Size::new(1000.0, 800.0),
            2.0,
        )
        .unwrap();
        assert_eq!(req.output_size(), (1600, 1600));
    }

    #[test]
    fn test_percent_crop_resolved_against_display() {
        let req = ExtractionRequest::new(
            CropRegion::percent(0.0, 0.0, 50.0, 50.0),
            Size::new(400.0, 400.0),
            Size::new(200.0, 200.0),
            1.0,
        )
        .unwrap();
        assert_eq!(req.crop(), CropRegion::pixels(0.0, 0.0, 100.0, 100.0));
        assert_eq!(req.output_size(), (200, 200));
    }

    #[test]
    fn test_output_size_rounds() {
        let req = ExtractionRequest::new(
            CropRegion::pixels(0.0, 0.0, 33.3, 10.0),
            Size::new(100.0, 100.0),
            Size::new(100.0, 100.0),
            1.5,
        )
        .unwrap();
        // 33.3 * 1.5 = 49.95, 10 * 1.5 = 15
        assert_eq!(req.output_size(), (50, 15));
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let crop = CropRegion::pixels(0.0, 0.0, 10.0, 10.0);
        let size = Size::new(100.0, 100.0);
        assert_eq!(
            ExtractionRequest::new(crop, size, Size::new(0.0, 100.0), 1.0),
            Err(ExtractError::Degenerate("displayed size"))
        );
        assert_eq!(
            ExtractionRequest::new(CropRegion::pixels(0.0, 0.0, 0.0, 10.0), size, size, 1.0),
            Err(ExtractError::Degenerate("crop region"))
        );
        assert!(matches!(
            ExtractionRequest::new(crop, size, size, f64::NAN),
            Err(ExtractError::InvalidPixelRatio(_))
        ));
    }
}
