//! Source image decoding.
//!
//! Turns the bytes of a picked file into an RGBA raster with its natural
//! pixel dimensions, the way a browser would render it in an `<img>` tag
//! (EXIF orientation applied).
//!
//! # Examples
//!
//! ```ignore
//! use folio_core::decode::decode_image;
//!
//! let bytes = std::fs::read("portrait.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod source;
mod types;

pub use source::{decode_image, natural_dimensions};
pub use types::{DecodeError, Orientation, RasterImage, CHANNELS};
