//! Upload coordinator: the state machine behind one image upload control.
//!
//! ```text
//! Idle → Selected → Validating ─┬─ Invalid → Idle
//!                               ├─ PreparingCrop → Cropping → Extracting ─┐
//!                               │        └──── use original ──────────────┤
//!                               └─ (cropping disabled) ───────────────────┴→ Uploading
//! Uploading → Committed | Failed → Idle
//! ```
//!
//! The coordinator is synchronous. Entering `Uploading` yields a
//! [`PendingUpload`] that the host drives against a
//! [`Transport`](crate::transport::Transport) and feeds back through
//! [`UploadCoordinator::settle`]. A new valid selection supersedes whatever flow is
//! open; a superseded upload still releases its own temporary reference but
//! its settlement is ignored.

mod coordinator;
mod error;
mod resource;
mod state;

pub use coordinator::{
    data_url, PendingUpload, UploadCommit, UploadCoordinator, UploadSettlement, CROPPED_FILE_STEM,
};
pub use error::FlowError;
pub use resource::{MemoryRegistry, SourceRegistry, TempSourceRef};
pub use state::{FlowId, FlowPhase, ImageValue, UploadFlowState};
