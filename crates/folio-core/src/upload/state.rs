use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::CropRegion;

/// Identifies one selection-to-settlement flow.
///
/// A settlement carrying an id other than the coordinator's in-flight id is
/// stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(pub u64);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the upload control is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadFlowState {
    Idle,
    Selected { flow: FlowId },
    Validating { flow: FlowId },
    Invalid { reason: String },
    /// Decoded and waiting for the host to lay the image out.
    PreparingCrop { flow: FlowId },
    /// The user is adjusting the crop. `crop` is in percent units.
    Cropping { flow: FlowId, crop: CropRegion },
    Extracting { flow: FlowId },
    Uploading { flow: FlowId },
    Committed { url: String },
    Failed { message: String },
}

impl UploadFlowState {
    pub fn phase(&self) -> FlowPhase {
        match self {
            UploadFlowState::Idle => FlowPhase::Idle,
            UploadFlowState::Selected { .. } => FlowPhase::Selected,
            UploadFlowState::Validating { .. } => FlowPhase::Validating,
            UploadFlowState::Invalid { .. } => FlowPhase::Invalid,
            UploadFlowState::PreparingCrop { .. } => FlowPhase::PreparingCrop,
            UploadFlowState::Cropping { .. } => FlowPhase::Cropping,
            UploadFlowState::Extracting { .. } => FlowPhase::Extracting,
            UploadFlowState::Uploading { .. } => FlowPhase::Uploading,
            UploadFlowState::Committed { .. } => FlowPhase::Committed,
            UploadFlowState::Failed { .. } => FlowPhase::Failed,
        }
    }

    /// Flow the state belongs to, for states tied to a selection.
    pub fn flow(&self) -> Option<FlowId> {
        match self {
            UploadFlowState::Selected { flow }
            | UploadFlowState::Validating { flow }
            | UploadFlowState::PreparingCrop { flow }
            | UploadFlowState::Cropping { flow, .. }
            | UploadFlowState::Extracting { flow }
            | UploadFlowState::Uploading { flow } => Some(*flow),
            UploadFlowState::Idle
            | UploadFlowState::Invalid { .. }
            | UploadFlowState::Committed { .. }
            | UploadFlowState::Failed { .. } => None,
        }
    }

    /// True while the cropper is open.
    pub fn is_cropping(&self) -> bool {
        matches!(
            self,
            UploadFlowState::PreparingCrop { .. } | UploadFlowState::Cropping { .. }
        )
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadFlowState::Uploading { .. })
    }
}

/// Data-free tag of [`UploadFlowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowPhase {
    Idle,
    Selected,
    Validating,
    Invalid,
    PreparingCrop,
    Cropping,
    Extracting,
    Uploading,
    Committed,
    Failed,
}

impl fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowPhase::Idle => "idle",
            FlowPhase::Selected => "selected",
            FlowPhase::Validating => "validating",
            FlowPhase::Invalid => "invalid",
            FlowPhase::PreparingCrop => "preparing crop",
            FlowPhase::Cropping => "cropping",
            FlowPhase::Extracting => "extracting",
            FlowPhase::Uploading => "uploading",
            FlowPhase::Committed => "committed",
            FlowPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The caller's image value.
///
/// Some forms store a bare URL, others `{url, alt}`; a committed upload comes
/// back in whichever shape the caller started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageValue {
    Text(String),
    Object {
        url: String,
        #[serde(default)]
        alt: String,
    },
}

impl Default for ImageValue {
    fn default() -> Self {
        ImageValue::Object {
            url: String::new(),
            alt: String::new(),
        }
    }
}

impl ImageValue {
    pub fn url(&self) -> &str {
        match self {
            ImageValue::Text(url) => url,
            ImageValue::Object { url, .. } => url,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url().is_empty()
    }

    /// A value of the same shape holding `url`; `alt` only applies to objects.
    pub fn with_url(&self, url: impl Into<String>, alt: impl Into<String>) -> Self {
        match self {
            ImageValue::Text(_) => ImageValue::Text(url.into()),
            ImageValue::Object { .. } => ImageValue::Object {
                url: url.into(),
                alt: alt.into(),
            },
        }
    }

    /// The cleared value of the same shape.
    pub fn cleared(&self) -> Self {
        self.with_url("", "")
    }
}
