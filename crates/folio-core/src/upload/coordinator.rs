use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, info, warn};

use super::error::FlowError;
use super::resource::{SourceRegistry, TempSourceRef};
use super::state::{FlowId, FlowPhase, ImageValue, UploadFlowState};
use crate::config::UploadConfig;
use crate::decode::decode_image;
use crate::encode::serialize;
use crate::extract::{ExtractionRequest, RasterExtractor, SoftwareExtractor};
use crate::geometry::{CropRegion, Size};
use crate::source::{SourceFile, SourceImage};
use crate::transport::{Transport, TransportError, UploadKind, UploadPayload, UploadedFile};
use crate::url::format_url;
use crate::validate::{validate, ValidationOutcome};

/// File stem of every cropped upload.
pub const CROPPED_FILE_STEM: &str = "cropped-image";

/// `data:` URL of `bytes`, used as the local preview while uploading.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// The picked file while the cropper is open.
struct CropSession {
    flow: FlowId,
    image: SourceImage,
    temp: TempSourceRef,
}

/// An upload that has left the coordinator and waits for the transport.
///
/// Owns the temporary source reference of its flow, so the reference is
/// released when the upload settles no matter what the coordinator has moved
/// on to.
#[derive(Debug)]
pub struct PendingUpload {
    flow: FlowId,
    kind: UploadKind,
    payload: UploadPayload,
    alt: String,
    was_original: bool,
    temp: Option<TempSourceRef>,
}

impl PendingUpload {
    pub fn flow(&self) -> FlowId {
        self.flow
    }

    pub fn payload(&self) -> &UploadPayload {
        &self.payload
    }

    /// Alt text the committed value will carry.
    pub fn alt(&self) -> &str {
        &self.alt
    }

    /// True when the untouched source file is being uploaded.
    pub fn was_original(&self) -> bool {
        self.was_original
    }

    /// Handle of the temporary source reference this upload keeps alive.
    pub fn source_handle(&self) -> Option<&str> {
        self.temp.as_ref().map(TempSourceRef::handle)
    }

    /// Send the payload and release the temporary reference.
    pub async fn run<T: Transport + ?Sized>(self, transport: &T) -> UploadSettlement {
        let PendingUpload {
            flow,
            kind,
            payload,
            alt,
            was_original,
            temp,
        } = self;

        debug!(%flow, file_name = %payload.file_name, size_bytes = payload.bytes.len(), "Upload started");
        let result = transport.upload(kind, payload).await;
        drop(temp);

        UploadSettlement {
            flow,
            result,
            alt,
            was_original,
        }
    }
}

/// Outcome of [`PendingUpload::run`], fed back through
/// [`UploadCoordinator::settle`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSettlement {
    pub flow: FlowId,
    pub result: Result<UploadedFile, TransportError>,
    pub alt: String,
    pub was_original: bool,
}

/// What the caller receives when an upload commits.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadCommit {
    /// New value, in the same shape as the caller's previous one.
    pub value: ImageValue,
    pub was_original: bool,
    pub file: UploadedFile,
}

/// Drives one image upload control from file selection to a committed URL.
pub struct UploadCoordinator {
    config: UploadConfig,
    server_base_url: String,
    registry: Arc<dyn SourceRegistry>,
    extractor: Box<dyn RasterExtractor>,
    state: UploadFlowState,
    history: Vec<FlowPhase>,
    session: Option<CropSession>,
    value: ImageValue,
    preview: Option<String>,
    committed_preview: Option<String>,
    error: Option<String>,
    next_flow: u64,
    in_flight: Option<FlowId>,
}

impl UploadCoordinator {
    /// `value` is the caller's current image; its URL becomes the preview.
    pub fn new(
        config: UploadConfig,
        server_base_url: impl Into<String>,
        registry: Arc<dyn SourceRegistry>,
        value: ImageValue,
    ) -> Self {
        let server_base_url = server_base_url.into();
        let preview = Some(format_url(&server_base_url, value.url())).filter(|p| !p.is_empty());
        Self {
            config,
            server_base_url,
            registry,
            extractor: Box::new(SoftwareExtractor::default()),
            state: UploadFlowState::Idle,
            history: vec![FlowPhase::Idle],
            session: None,
            value,
            committed_preview: preview.clone(),
            preview,
            error: None,
            next_flow: 0,
            in_flight: None,
        }
    }

    /// Replace the raster extractor.
    pub fn with_extractor(mut self, extractor: impl RasterExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn state(&self) -> &UploadFlowState {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        self.state.phase()
    }

    /// Phases visited since the last selection, without repeats.
    pub fn history(&self) -> &[FlowPhase] {
        &self.history
    }

    /// What the control currently shows: a server URL or a `data:` URL.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// Last user-facing error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn value(&self) -> &ImageValue {
        &self.value
    }

    /// Adopt a new caller value, e.g. after the form reloads.
    pub fn set_value(&mut self, value: ImageValue) {
        let preview = Some(format_url(&self.server_base_url, value.url())).filter(|p| !p.is_empty());
        self.committed_preview = preview.clone();
        if !self.state.is_uploading() {
            self.preview = preview;
        }
        self.value = value;
    }

    /// Picked image while the cropper is open.
    pub fn source_image(&self) -> Option<&SourceImage> {
        self.session.as_ref().map(|s| &s.image)
    }

    /// Temporary reference the host renders the cropper from.
    pub fn source_handle(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.temp.handle())
    }

    /// Current crop in pixels of the displayed image.
    pub fn crop(&self) -> Option<CropRegion> {
        match (&self.state, &self.session) {
            (UploadFlowState::Cropping { crop, .. }, Some(session)) => {
                Some(crop.to_pixels(session.image.displayed_or_natural()))
            }
            _ => None,
        }
    }

    /// Start a flow for `file`, superseding any flow in progress.
    ///
    /// Returns a [`PendingUpload`] straight away when cropping is disabled;
    /// otherwise the cropper opens and `None` is returned. A file that is
    /// rejected or fails to decode leaves an open cropper or in-flight
    /// upload untouched.
    pub fn select(&mut self, file: SourceFile) -> Result<Option<PendingUpload>, FlowError> {
        debug!(file_name = %file.name, mime_type = %file.mime_type, size_bytes = file.size(), "File selected");

        if let ValidationOutcome::Rejected { reason } = validate(&file, self.config.max_file_bytes) {
            warn!(reason = %reason, "File rejected");
            if !self.has_active_flow() {
                self.start_flow();
                self.transition(UploadFlowState::Invalid {
                    reason: reason.clone(),
                });
                self.transition(UploadFlowState::Idle);
            }
            self.error = Some(reason.clone());
            return Err(FlowError::Validation(reason));
        }

        if !self.config.cropping_enabled {
            self.supersede();
            let flow = self.start_flow();
            self.error = None;
            let alt = file.stem().to_string();
            let payload = UploadPayload::new(file.bytes.clone(), file.name, file.mime_type);
            return Ok(Some(self.begin_upload(flow, payload, alt, true, None)));
        }

        let temp = TempSourceRef::acquire(self.registry.clone(), &file);
        let raster = match decode_image(&file.bytes) {
            Ok(raster) => raster,
            Err(err) => {
                drop(temp);
                let err = FlowError::Decode(err);
                if self.has_active_flow() {
                    warn!(error = %err, "Ignoring undecodable file");
                    self.error = Some(err.to_string());
                    return Err(err);
                }
                self.start_flow();
                return Err(self.fail(err));
            }
        };

        self.supersede();
        let flow = self.start_flow();
        self.error = None;
        self.session = Some(CropSession {
            flow,
            image: SourceImage::new(file, raster),
            temp,
        });
        self.transition(UploadFlowState::PreparingCrop { flow });
        Ok(None)
    }

    /// [`UploadCoordinator::select`] on the first of several dropped files.
    pub fn select_first<I>(&mut self, files: I) -> Result<Option<PendingUpload>, FlowError>
    where
        I: IntoIterator<Item = SourceFile>,
    {
        match files.into_iter().next() {
            Some(file) => self.select(file),
            None => Ok(None),
        }
    }

    /// The host has laid the image out at `width`×`height`.
    ///
    /// Opens the cropper with the initial crop, or re-fits the current crop
    /// after a relayout. Returns the crop in displayed pixels.
    pub fn image_displayed(&mut self, width: f64, height: f64) -> Result<CropRegion, FlowError> {
        let (flow, current) = match &self.state {
            UploadFlowState::PreparingCrop { flow } => (*flow, None),
            UploadFlowState::Cropping { flow, crop } => (*flow, Some(*crop)),
            other => return Err(invalid("lay out the image", other)),
        };
        let constraints = self.config.constraints();
        let session = self.session_for(flow, "lay out the image")?;

        let mut size = Size::new(width, height);
        if size.is_degenerate() {
            size = session.image.natural();
        }
        session.image.displayed = Some(size);

        let crop = match current {
            Some(crop) => constraints.apply(crop, size).to_percent(size),
            None => constraints.initial(size.width, size.height),
        };
        self.transition(UploadFlowState::Cropping { flow, crop });
        Ok(crop.to_pixels(size))
    }

    /// Apply a user adjustment, normalized to the aspect ratio and clamped.
    ///
    /// `region` is relative to the displayed image. Returns the accepted crop
    /// in displayed pixels.
    pub fn adjust_crop(&mut self, region: CropRegion) -> Result<CropRegion, FlowError> {
        let flow = match &self.state {
            UploadFlowState::Cropping { flow, .. } => *flow,
            other => return Err(invalid("adjust the crop", other)),
        };
        let constraints = self.config.constraints();
        let size = self.session_for(flow, "adjust the crop")?.image.displayed_or_natural();

        let crop = constraints.apply(region, size).to_percent(size);
        self.transition(UploadFlowState::Cropping { flow, crop });
        Ok(crop.to_pixels(size))
    }

    /// Extract and serialize the current crop, then hand it to upload.
    pub fn confirm_crop(&mut self) -> Result<PendingUpload, FlowError> {
        let (flow, crop) = match &self.state {
            UploadFlowState::Cropping { flow, crop } => (*flow, *crop),
            other => return Err(invalid("confirm the crop", other)),
        };
        let session = self.take_session(flow, "confirm the crop")?;
        self.transition(UploadFlowState::Extracting { flow });

        let bytes = match self.render(&session.image, crop) {
            Ok(bytes) => bytes,
            Err(err) => {
                drop(session);
                return Err(self.fail(err));
            }
        };

        let format = self.config.output_format;
        let payload = UploadPayload::new(
            bytes,
            format!("{CROPPED_FILE_STEM}.{}", format.extension()),
            format.mime_type(),
        );
        Ok(self.begin_upload(flow, payload, CROPPED_FILE_STEM.to_string(), false, Some(session.temp)))
    }

    /// Skip cropping and upload the picked file as is.
    pub fn use_original(&mut self) -> Result<PendingUpload, FlowError> {
        let flow = match &self.state {
            UploadFlowState::PreparingCrop { flow } | UploadFlowState::Cropping { flow, .. } => *flow,
            other => return Err(invalid("use the original", other)),
        };
        let session = self.take_session(flow, "use the original")?;
        let file = session.image.file;
        let alt = file.stem().to_string();
        let payload = UploadPayload::new(file.bytes, file.name, file.mime_type);
        Ok(self.begin_upload(flow, payload, alt, true, Some(session.temp)))
    }

    /// Close the cropper without uploading.
    pub fn cancel(&mut self) -> Result<(), FlowError> {
        if !self.state.is_cropping() {
            return Err(invalid("cancel", &self.state));
        }
        self.session = None;
        self.transition(UploadFlowState::Idle);
        Ok(())
    }

    /// Clear the image. Returns the empty value in the caller's shape.
    pub fn remove_image(&mut self) -> ImageValue {
        self.supersede();
        self.preview = None;
        self.committed_preview = None;
        self.error = None;
        self.value = self.value.cleared();
        self.transition(UploadFlowState::Idle);
        self.value.clone()
    }

    /// Fold a finished upload back into the control.
    ///
    /// Settlements of superseded flows are ignored and yield `Ok(None)`.
    pub fn settle(&mut self, settlement: UploadSettlement) -> Result<Option<UploadCommit>, FlowError> {
        if self.in_flight != Some(settlement.flow) {
            debug!(flow = %settlement.flow, "Ignoring stale upload settlement");
            return Ok(None);
        }
        self.in_flight = None;

        match settlement.result {
            Ok(file) => {
                let preview = format_url(&self.server_base_url, &file.url);
                self.preview = Some(preview).filter(|p| !p.is_empty());
                self.committed_preview = self.preview.clone();
                self.value = self.value.with_url(file.url.clone(), settlement.alt);
                self.error = None;
                info!(flow = %settlement.flow, url = %file.url, was_original = settlement.was_original, "Upload committed");
                self.transition(UploadFlowState::Committed {
                    url: file.url.clone(),
                });
                Ok(Some(UploadCommit {
                    value: self.value.clone(),
                    was_original: settlement.was_original,
                    file,
                }))
            }
            Err(err) => {
                self.preview = self.committed_preview.clone();
                Err(self.fail(FlowError::Transport(err)))
            }
        }
    }

    /// Run `pending` against `transport` and settle it.
    pub async fn upload<T: Transport + ?Sized>(
        &mut self,
        pending: PendingUpload,
        transport: &T,
    ) -> Result<Option<UploadCommit>, FlowError> {
        let settlement = pending.run(transport).await;
        self.settle(settlement)
    }

    fn transition(&mut self, next: UploadFlowState) {
        let from = self.state.phase();
        let to = next.phase();
        if from != to {
            debug!(%from, %to, "Upload flow transition");
        }
        if self.history.last() != Some(&to) {
            self.history.push(to);
        }
        self.state = next;
    }

    /// Record `err` as the user-facing message and return to idle.
    fn fail(&mut self, err: FlowError) -> FlowError {
        let message = err.to_string();
        warn!(error = %message, "Upload flow failed");
        self.error = Some(message.clone());
        self.transition(UploadFlowState::Failed { message });
        self.transition(UploadFlowState::Idle);
        err
    }

    /// Allocate the next flow and walk it through selection.
    fn start_flow(&mut self) -> FlowId {
        self.history.clear();
        self.next_flow += 1;
        let flow = FlowId(self.next_flow);
        self.transition(UploadFlowState::Selected { flow });
        self.transition(UploadFlowState::Validating { flow });
        flow
    }

    fn has_active_flow(&self) -> bool {
        self.session.is_some() || self.in_flight.is_some()
    }

    /// Drop the open cropper and detach from any in-flight upload.
    fn supersede(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(flow = %session.flow, "Superseding open crop");
        }
        if let Some(flow) = self.in_flight.take() {
            debug!(%flow, "Superseding in-flight upload");
            self.preview = self.committed_preview.clone();
        }
    }

    fn session_for(&mut self, flow: FlowId, action: &'static str) -> Result<&mut CropSession, FlowError> {
        let phase = self.state.phase();
        self.session
            .as_mut()
            .filter(|s| s.flow == flow)
            .ok_or(FlowError::InvalidTransition { action, phase })
    }

    fn take_session(&mut self, flow: FlowId, action: &'static str) -> Result<CropSession, FlowError> {
        match self.session.take() {
            Some(session) if session.flow == flow => Ok(session),
            other => {
                self.session = other;
                Err(invalid(action, &self.state))
            }
        }
    }

    fn render(&self, image: &SourceImage, crop: CropRegion) -> Result<Vec<u8>, FlowError> {
        let request = ExtractionRequest::new(
            crop,
            image.natural(),
            image.displayed_or_natural(),
            self.config.device_pixel_ratio,
        )?;
        let (width, height) = request.output_size();
        debug!(width, height, "Extracting crop");
        let buffer = self.extractor.extract(&image.raster, request);
        Ok(serialize(&buffer, self.config.output_format, self.config.quality)?)
    }

    fn begin_upload(
        &mut self,
        flow: FlowId,
        payload: UploadPayload,
        alt: String,
        was_original: bool,
        temp: Option<TempSourceRef>,
    ) -> PendingUpload {
        self.preview = Some(data_url(&payload.mime_type, &payload.bytes));
        self.in_flight = Some(flow);
        self.transition(UploadFlowState::Uploading { flow });
        PendingUpload {
            flow,
            kind: UploadKind::Image,
            payload,
            alt,
            was_original,
            temp,
        }
    }
}

fn invalid(action: &'static str, state: &UploadFlowState) -> FlowError {
    FlowError::InvalidTransition {
        action,
        phase: state.phase(),
    }
}
