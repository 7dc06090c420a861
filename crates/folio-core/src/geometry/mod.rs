//! Crop geometry: placing, normalizing and constraining crop rectangles.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of the image
//! - Regions carry their unit: percent of the image (used by the overlay, so
//!   it is independent of zoom) or pixels (used for extraction)
//! - Aspect ratios are width over height
//!
//! # Clamping Policy
//!
//! Every operation clamps out-of-bounds input into the image. None of them
//! fail; a request that cannot be honoured degrades to the largest region
//! that fits.

mod crop;
mod region;

pub use crop::{constrain, initial_crop, normalize_for_aspect, CropConstraints, INITIAL_WIDTH_PERCENT};
pub use region::{CropRegion, CropUnit, Size, EPSILON};
