//! Folio Core - crop and upload pipeline
//!
//! This crate provides the client-side image pipeline of the folio portfolio
//! admin: validating picked files, placing and constraining crop regions,
//! extracting the crop at display resolution, encoding it, and uploading it
//! through a pluggable transport.

pub mod config;
pub mod decode;
pub mod encode;
pub mod extract;
pub mod geometry;
pub mod source;
pub mod storage;
pub mod transport;
pub mod upload;
pub mod url;
pub mod validate;

pub use config::{ConfigError, CropShape, TransportConfig, UploadConfig};
pub use decode::{decode_image, DecodeError, RasterImage};
pub use encode::{serialize, EncodeError, OutputFormat};
pub use extract::{ExtractionRequest, PixelBuffer, RasterExtractor, SoftwareExtractor};
pub use geometry::{initial_crop, CropConstraints, CropRegion, CropUnit, Size};
pub use source::{SourceFile, SourceImage};
pub use transport::{Transport, TransportError, UploadKind, UploadPayload, UploadedFile};
pub use upload::{FlowError, ImageValue, PendingUpload, UploadCoordinator, UploadFlowState};
pub use url::format_url;
pub use validate::{validate, ValidationOutcome};

/// Flat outcome of an upload, for hosts that only need success and a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadResult {
    pub success: bool,
    /// Server URL of the stored file, on success.
    pub url: Option<String>,
    /// Error message, on failure.
    pub message: Option<String>,
}

impl UploadResult {
    pub fn success(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            message: Some(message.into()),
        }
    }
}

impl From<&Result<UploadedFile, TransportError>> for UploadResult {
    fn from(result: &Result<UploadedFile, TransportError>) -> Self {
        match result {
            Ok(file) => Self::success(file.url.clone()),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

impl From<&upload::UploadSettlement> for UploadResult {
    fn from(settlement: &upload::UploadSettlement) -> Self {
        Self::from(&settlement.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_result_success() {
        let outcome: Result<UploadedFile, TransportError> = Ok(UploadedFile::from_url("/uploads/a.png"));
        let result = UploadResult::from(&outcome);
        assert!(result.success);
        assert_eq!(result.url.as_deref(), Some("/uploads/a.png"));
        assert_eq!(result.message, None);
    }

    #[test]
    fn test_upload_result_failure() {
        let outcome: Result<UploadedFile, TransportError> = Err(TransportError::Rejected("Too big".into()));
        let result = UploadResult::from(&outcome);
        assert!(!result.success);
        assert_eq!(result.url, None);
        assert_eq!(result.message.as_deref(), Some("Too big"));
    }

    #[test]
    fn test_upload_result_default_is_failure() {
        assert!(!UploadResult::default().success);
    }
}
