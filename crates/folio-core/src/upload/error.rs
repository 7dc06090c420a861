use thiserror::Error;

use super::state::FlowPhase;
use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::extract::ExtractError;
use crate::transport::TransportError;

/// Everything that can end an upload flow early.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The picked file failed the validation gate.
    #[error("{0}")]
    Validation(String),

    /// Extraction or serialization of the crop failed.
    #[error("Failed to process image: {0}")]
    EncodingFailed(String),

    #[error("Upload failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to load image: {0}")]
    Decode(#[from] DecodeError),

    /// The operation does not apply to the current state.
    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: FlowPhase,
    },
}

impl From<EncodeError> for FlowError {
    fn from(err: EncodeError) -> Self {
        FlowError::EncodingFailed(err.to_string())
    }
}

impl From<ExtractError> for FlowError {
    fn from(err: ExtractError) -> Self {
        FlowError::EncodingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = FlowError::from(TransportError::Rejected("Disk full".into()));
        assert_eq!(err.to_string(), "Upload failed: Disk full");

        let err = FlowError::Validation("Please select an image file".into());
        assert_eq!(err.to_string(), "Please select an image file");

        let err = FlowError::InvalidTransition {
            action: "confirm crop",
            phase: FlowPhase::Idle,
        };
        assert_eq!(err.to_string(), "Cannot confirm crop while idle");
    }

    #[test]
    fn test_extract_maps_to_encoding_failed() {
        let err = FlowError::from(ExtractError::InvalidPixelRatio(0.0));
        assert!(matches!(err, FlowError::EncodingFailed(_)));
    }
}
