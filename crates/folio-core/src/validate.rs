//! Validation gate: cheap checks before any decoding or network work.
//!
//! Rejections are routine user-input conditions, so they come back as a
//! [`ValidationOutcome`] value rather than an error.

use serde::{Deserialize, Serialize};

use crate::source::SourceFile;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// MIME prefix every accepted file must carry.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Result of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ValidationOutcome {
    Ok,
    Rejected { reason: String },
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Ok)
    }

    /// The user-facing reason, if rejected.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationOutcome::Ok => None,
            ValidationOutcome::Rejected { reason } => Some(reason),
        }
    }
}

/// Check the declared type and size of a picked file.
pub fn validate(file: &SourceFile, max_bytes: u64) -> ValidationOutcome {
    validate_parts(&file.mime_type, file.size(), max_bytes)
}

/// [`validate`] on raw attributes, for hosts that have not read the bytes yet.
pub fn validate_parts(mime_type: &str, size: u64, max_bytes: u64) -> ValidationOutcome {
    if !mime_type.starts_with(IMAGE_MIME_PREFIX) {
        return ValidationOutcome::Rejected {
            reason: "Please select an image file".to_string(),
        };
    }

    if size > max_bytes {
        return ValidationOutcome::Rejected {
            reason: format!("File size must be less than {}MB", format_megabytes(max_bytes)),
        };
    }

    ValidationOutcome::Ok
}

/// Whole megabytes (MiB), rounded half away from zero.
pub fn format_megabytes(bytes: u64) -> u64 {
    (bytes as f64 / BYTES_PER_MEGABYTE).round() as u64
}
