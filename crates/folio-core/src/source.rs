//! Files picked by the user and the images decoded from them.

use std::sync::Arc;

use crate::decode::RasterImage;
use crate::geometry::Size;

/// A file handed over by the file input or a drop event.
///
/// The bytes are shared so the original can be forwarded to the transport
/// ("use full image") without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    /// Declared MIME type, as reported by the host. May be empty.
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Byte size of the content.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File name up to the first `.`, used as default alt text.
    pub fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }
}

/// A picked image once decoded, as shown in the cropper.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub file: SourceFile,
    pub raster: RasterImage,
    /// Size the image is rendered at, once the host reports it.
    pub displayed: Option<Size>,
}

impl SourceImage {
    pub fn new(file: SourceFile, raster: RasterImage) -> Self {
        Self {
            file,
            raster,
            displayed: None,
        }
    }

    pub fn natural(&self) -> Size {
        Size::from_pixels(self.raster.width, self.raster.height)
    }

    /// Displayed size, falling back to the natural size when not yet laid out.
    pub fn displayed_or_natural(&self) -> Size {
        self.displayed.unwrap_or_else(|| self.natural())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem() {
        assert_eq!(SourceFile::new("portrait.final.png", "image/png", Vec::<u8>::new()).stem(), "portrait");
        assert_eq!(SourceFile::new("cropped-image.png", "image/png", Vec::<u8>::new()).stem(), "cropped-image");
        assert_eq!(SourceFile::new("noext", "image/png", Vec::<u8>::new()).stem(), "noext");
        assert_eq!(SourceFile::new(".hidden", "image/png", Vec::<u8>::new()).stem(), "");
    }

    #[test]
    fn test_size() {
        let file = SourceFile::new("a.png", "image/png", vec![0u8; 42]);
        assert_eq!(file.size(), 42);
    }

    #[test]
    fn test_displayed_fallback() {
        let image = SourceImage::new(
            SourceFile::new("a.png", "image/png", Vec::<u8>::new()),
            RasterImage::blank(30, 20),
        );
        assert_eq!(image.displayed_or_natural(), Size::new(30.0, 20.0));
    }
}
