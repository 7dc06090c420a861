//! Raster extraction: turning a confirmed crop into a pixel buffer.
//!
//! The crop is drawn on the image as displayed, which may be scaled by
//! layout; extraction maps it back onto natural pixels and renders it at
//! device resolution so the result stays sharp on high-density screens.
//!
//! Extraction is host-specific (a browser canvas, a native 2D context, a
//! headless image library), so it sits behind the [`RasterExtractor`] trait.
//! [`SoftwareExtractor`] is the pure-Rust implementation.
//!
//! # Example
//!
//! ```ignore
//! use folio_core::extract::{ExtractionRequest, RasterExtractor, SoftwareExtractor};
//! use folio_core::geometry::{CropRegion, Size};
//!
//! let request = ExtractionRequest::new(
//!     CropRegion::pixels(100.0, 0.0, 800.0, 800.0),
//!     Size::new(1000.0, 800.0),
//!     Size::new(1000.0, 800.0),
//!     2.0,
//! )?;
//! let buffer = SoftwareExtractor::default().extract(&source, request);
//! assert_eq!(buffer.dimensions(), (1600, 1600));
//! ```

mod request;
mod software;

use crate::decode::RasterImage;

pub use request::{ExtractError, ExtractionRequest};
pub use software::{ResampleFilter, SoftwareExtractor};

/// Output of an extraction, RGBA8.
pub type PixelBuffer = RasterImage;

/// Renders the crop described by a request out of a source raster.
///
/// Implementations must return a buffer of exactly
/// [`ExtractionRequest::output_size`] and must never sample outside the
/// source; a request reaching past the source bounds is clamped, not
/// rejected.
pub trait RasterExtractor {
    fn extract(&self, source: &RasterImage, request: ExtractionRequest) -> PixelBuffer;
}
