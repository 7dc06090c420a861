//! Upload flow WASM bindings.
//!
//! [`JsUploadCoordinator`] wraps the core state machine. The page performs
//! the actual HTTP request (so it can reuse its own fetch and auth handling)
//! and reports the outcome back through `settle`.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const flow = new JsUploadCoordinator({ aspectRatio: 1 }, SERVER_URL, currentImage);
//! flow.select(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! cropperImg.src = flow.source_url;
//! cropperImg.onload = () => flow.image_displayed(cropperImg.width, cropperImg.height);
//!
//! const id = flow.confirm_crop();
//! const form = new FormData();
//! form.append('image', new Blob([flow.upload_bytes(id)], { type: flow.upload_mime_type(id) }),
//!             flow.upload_file_name(id));
//! const res = await fetch(`${API_URL}/upload/image`, { method: 'POST', body: form }).then(r => r.json());
//! const commit = flow.settle(id, { success: res.status === 'success', url: res.imageUrl, message: res.message });
//! if (commit) onImageSelect(commit.value);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use folio_core::upload::{
    FlowError, FlowId, ImageValue, PendingUpload, SourceRegistry, UploadCommit, UploadCoordinator,
    UploadSettlement,
};
use folio_core::{
    format_url as core_format_url, validate, CropRegion, SourceFile, TransportError, UploadConfig,
    UploadResult, UploadedFile, ValidationOutcome,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::extract::current_device_pixel_ratio;
use crate::types::js_error;

/// Check a file's declared type and size before reading it.
///
/// Returns `{ status: "ok" }` or `{ status: "rejected", reason }`.
#[wasm_bindgen]
pub fn validate_file(mime_type: &str, size: f64, max_bytes: f64) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&validate_attributes(mime_type, size, max_bytes)).map_err(js_error)
}

/// Resolve a server-relative path against the server base URL.
#[wasm_bindgen]
pub fn format_url(server_base_url: &str, path: &str) -> String {
    core_format_url(server_base_url, path)
}

pub(crate) fn validate_attributes(mime_type: &str, size: f64, max_bytes: f64) -> ValidationOutcome {
    validate::validate_parts(mime_type, to_byte_count(size), to_byte_count(max_bytes))
}

fn to_byte_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

/// Parse the constructor's config object. The screen's device pixel ratio
/// applies unless the object sets `devicePixelRatio` itself.
pub(crate) fn config_from_js(config: JsValue) -> Result<UploadConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(with_screen_ratio(UploadConfig::default(), false, current_device_pixel_ratio()));
    }
    let explicit = js_sys::Reflect::has(&config, &JsValue::from_str("devicePixelRatio")).unwrap_or(false);
    let parsed: UploadConfig = serde_wasm_bindgen::from_value(config).map_err(js_error)?;
    Ok(with_screen_ratio(parsed, explicit, current_device_pixel_ratio()))
}

fn with_screen_ratio(mut config: UploadConfig, explicit: bool, screen_ratio: f64) -> UploadConfig {
    if !explicit {
        config.device_pixel_ratio = screen_ratio;
    }
    config
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsCommit {
    value: ImageValue,
    was_original: bool,
}

/// Object URLs for the cropper, revoked when the flow lets go of them.
#[cfg(target_arch = "wasm32")]
struct ObjectUrlRegistry;

#[cfg(target_arch = "wasm32")]
impl SourceRegistry for ObjectUrlRegistry {
    fn create(&self, file: &SourceFile) -> String {
        let bytes = js_sys::Uint8Array::from(&file.bytes[..]);
        let parts = js_sys::Array::of1(&bytes);
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(&file.mime_type);
        web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .and_then(|blob| web_sys::Url::create_object_url_with_blob(&blob))
            .unwrap_or_else(|err| {
                web_sys::console::warn_1(&err);
                String::new()
            })
    }

    fn revoke(&self, handle: &str) {
        if !handle.is_empty() {
            if let Err(err) = web_sys::Url::revoke_object_url(handle) {
                web_sys::console::warn_1(&err);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn default_registry() -> Arc<dyn SourceRegistry> {
    Arc::new(ObjectUrlRegistry)
}

#[cfg(not(target_arch = "wasm32"))]
fn default_registry() -> Arc<dyn SourceRegistry> {
    Arc::new(folio_core::upload::MemoryRegistry::new())
}

/// One image upload control.
#[wasm_bindgen]
pub struct JsUploadCoordinator {
    inner: UploadCoordinator,
    pending: HashMap<u64, PendingUpload>,
}

#[wasm_bindgen]
impl JsUploadCoordinator {
    /// `config` takes the camelCase fields of the upload configuration; any
    /// missing field uses its default. `value` is the current image, either
    /// a URL string or `{ url, alt }`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, server_base_url: String, value: JsValue) -> Result<JsUploadCoordinator, JsValue> {
        let config = config_from_js(config)?;
        config.validate().map_err(js_error)?;

        let value = if value.is_undefined() || value.is_null() {
            ImageValue::default()
        } else {
            serde_wasm_bindgen::from_value(value).map_err(js_error)?
        };

        Ok(Self::with_parts(config, server_base_url, default_registry(), value))
    }

    /// Start a flow. Returns the upload id when cropping is disabled and the
    /// file is ready to send, `undefined` when the cropper opens.
    pub fn select(&mut self, name: String, mime_type: String, bytes: Vec<u8>) -> Result<Option<u32>, JsValue> {
        let pending = self
            .inner
            .select(SourceFile::new(name, mime_type, bytes))
            .map_err(js_error)?;
        Ok(pending.map(|p| self.park(p)))
    }

    /// Report the rendered size of the cropper image. Returns the crop in
    /// displayed pixels.
    pub fn image_displayed(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let crop = self.inner.image_displayed(width, height).map_err(js_error)?;
        serde_wasm_bindgen::to_value(&crop).map_err(js_error)
    }

    /// Apply a dragged region; returns the accepted one in displayed pixels.
    pub fn adjust_crop(&mut self, region: JsValue) -> Result<JsValue, JsValue> {
        let region: CropRegion = serde_wasm_bindgen::from_value(region).map_err(js_error)?;
        let crop = self.inner.adjust_crop(region).map_err(js_error)?;
        serde_wasm_bindgen::to_value(&crop).map_err(js_error)
    }

    /// Extract and encode the crop. Returns the upload id.
    pub fn confirm_crop(&mut self) -> Result<u32, JsValue> {
        let pending = self.inner.confirm_crop().map_err(js_error)?;
        Ok(self.park(pending))
    }

    /// Upload the picked file without cropping. Returns the upload id.
    pub fn use_original(&mut self) -> Result<u32, JsValue> {
        let pending = self.inner.use_original().map_err(js_error)?;
        Ok(self.park(pending))
    }

    pub fn cancel(&mut self) -> Result<(), JsValue> {
        self.inner.cancel().map_err(js_error)
    }

    /// Clear the image; returns the empty value to store.
    pub fn remove_image(&mut self) -> Result<JsValue, JsValue> {
        let value = self.inner.remove_image();
        serde_wasm_bindgen::to_value(&value).map_err(js_error)
    }

    pub fn upload_bytes(&self, id: u32) -> Option<Vec<u8>> {
        self.pending
            .get(&u64::from(id))
            .map(|p| p.payload().bytes.to_vec())
    }

    pub fn upload_file_name(&self, id: u32) -> Option<String> {
        self.pending
            .get(&u64::from(id))
            .map(|p| p.payload().file_name.clone())
    }

    pub fn upload_mime_type(&self, id: u32) -> Option<String> {
        self.pending
            .get(&u64::from(id))
            .map(|p| p.payload().mime_type.clone())
    }

    /// Report the outcome of upload `id` as `{ success, url, message }`.
    ///
    /// Returns `{ value, wasOriginal }` on commit, `null` when the upload was
    /// superseded, and throws the user-facing message on failure.
    pub fn settle(&mut self, id: u32, result: JsValue) -> Result<JsValue, JsValue> {
        let result: UploadResult = serde_wasm_bindgen::from_value(result).map_err(js_error)?;
        match self.settle_result(u64::from(id), result).map_err(js_error)? {
            Some(commit) => serde_wasm_bindgen::to_value(&JsCommit {
                value: commit.value,
                was_original: commit.was_original,
            })
            .map_err(js_error),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.inner.phase().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn preview(&self) -> Option<String> {
        self.inner.preview().map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.inner.error().map(str::to_string)
    }

    /// Object URL the cropper renders from while it is open.
    #[wasm_bindgen(getter)]
    pub fn source_url(&self) -> Option<String> {
        self.inner.source_handle().map(str::to_string)
    }
}

impl JsUploadCoordinator {
    pub(crate) fn with_parts(
        config: UploadConfig,
        server_base_url: String,
        registry: Arc<dyn SourceRegistry>,
        value: ImageValue,
    ) -> Self {
        Self {
            inner: UploadCoordinator::new(config, server_base_url, registry, value),
            pending: HashMap::new(),
        }
    }

    fn park(&mut self, pending: PendingUpload) -> u32 {
        let FlowId(id) = pending.flow();
        self.pending.insert(id, pending);
        id as u32
    }

    /// Drop the parked upload (releasing its source) and settle the flow.
    pub(crate) fn settle_result(
        &mut self,
        id: u64,
        result: UploadResult,
    ) -> Result<Option<UploadCommit>, FlowError> {
        let Some(pending) = self.pending.remove(&id) else {
            return Ok(None);
        };
        let settlement = UploadSettlement {
            flow: pending.flow(),
            alt: pending.alt().to_string(),
            was_original: pending.was_original(),
            result: match (result.success, result.url) {
                (true, Some(url)) if !url.is_empty() => Ok(UploadedFile::from_url(url)),
                _ => Err(TransportError::Rejected(
                    result.message.unwrap_or_else(|| "Upload failed".to_string()),
                )),
            },
        };
        drop(pending);
        self.inner.settle(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::decode::RasterImage;
    use folio_core::encode::encode_png;
    use folio_core::upload::{FlowPhase, MemoryRegistry};

    fn coordinator(registry: &Arc<MemoryRegistry>) -> JsUploadCoordinator {
        JsUploadCoordinator::with_parts(
            UploadConfig::default(),
            "http://localhost:5001".to_string(),
            registry.clone(),
            ImageValue::Text("/uploads/old.png".to_string()),
        )
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RasterImage::blank(width, height)).unwrap()
    }

    #[test]
    fn test_validate_attributes() {
        assert!(validate_attributes("image/png", 100.0, 100.0).is_ok());
        assert!(!validate_attributes("image/png", 101.0, 100.0).is_ok());
        assert!(!validate_attributes("application/pdf", 1.0, 100.0).is_ok());
    }

    #[test]
    fn test_format_url() {
        assert_eq!(format_url("http://h", "uploads/a.png"), "http://h/uploads/a.png");
    }

    #[test]
    fn test_crop_upload_commit() {
        let registry = Arc::new(MemoryRegistry::new());
        let mut flow = coordinator(&registry);

        assert_eq!(flow.select("me.png".into(), "image/png".into(), png(300, 300)).unwrap(), None);
        flow.inner.image_displayed(300.0, 300.0).unwrap();
        let id = flow.confirm_crop().unwrap();
        assert_eq!(flow.upload_file_name(id).as_deref(), Some("cropped-image.png"));
        assert_eq!(flow.upload_mime_type(id).as_deref(), Some("image/png"));
        assert!(flow.upload_bytes(id).is_some());
        assert_eq!(registry.live_count(), 1);

        let commit = flow
            .settle_result(u64::from(id), UploadResult::success("/uploads/images/new.png"))
            .unwrap()
            .unwrap();
        assert_eq!(commit.value, ImageValue::Text("/uploads/images/new.png".into()));
        assert_eq!(flow.phase(), "committed");
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.total_revocations(), 1);
        assert!(flow.upload_bytes(id).is_none());
    }

    #[test]
    fn test_failure_message_and_revert() {
        let registry = Arc::new(MemoryRegistry::new());
        let mut flow = coordinator(&registry);
        flow.select("me.png".into(), "image/png".into(), png(20, 20)).unwrap();
        let id = flow.use_original().unwrap();

        let err = flow
            .settle_result(u64::from(id), UploadResult::failure("Invalid token"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Upload failed: Invalid token");
        assert_eq!(flow.error().as_deref(), Some("Upload failed: Invalid token"));
        assert_eq!(flow.preview().as_deref(), Some("http://localhost:5001/uploads/old.png"));
        assert_eq!(flow.inner.phase(), FlowPhase::Idle);
        assert_eq!(registry.total_revocations(), 1);
    }

    #[test]
    fn test_superseded_upload_is_stale() {
        let registry = Arc::new(MemoryRegistry::new());
        let mut flow = coordinator(&registry);
        flow.select("a.png".into(), "image/png".into(), png(20, 20)).unwrap();
        let first = flow.use_original().unwrap();
        flow.select("b.png".into(), "image/png".into(), png(20, 20)).unwrap();

        let outcome = flow
            .settle_result(u64::from(first), UploadResult::success("/uploads/a.png"))
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(flow.inner.phase(), FlowPhase::PreparingCrop);
        assert_eq!(registry.total_revocations(), 1);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_screen_ratio_fills_missing_field() {
        let mut config = UploadConfig::default();
        config.aspect_ratio = Some(16.0 / 9.0);
        let resolved = with_screen_ratio(config, false, 2.0);
        assert_eq!(resolved.device_pixel_ratio, 2.0);
        assert_eq!(resolved.aspect_ratio, Some(16.0 / 9.0));
    }

    #[test]
    fn test_explicit_ratio_wins() {
        let mut config = UploadConfig::default();
        config.device_pixel_ratio = 3.0;
        assert_eq!(with_screen_ratio(config, true, 2.0).device_pixel_ratio, 3.0);
    }

    #[test]
    fn test_unknown_id_ignored() {
        let registry = Arc::new(MemoryRegistry::new());
        let mut flow = coordinator(&registry);
        assert!(flow
            .settle_result(42, UploadResult::success("/x.png"))
            .unwrap()
            .is_none());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn object(entries: &[(&str, f64)]) -> JsValue {
        let obj = js_sys::Object::new();
        for (key, value) in entries {
            js_sys::Reflect::set(&obj, &JsValue::from_str(key), &JsValue::from_f64(*value)).unwrap();
        }
        obj.into()
    }

    #[wasm_bindgen_test]
    fn test_config_object_uses_screen_ratio() {
        let config = config_from_js(object(&[("aspectRatio", 1.0)])).unwrap();
        assert_eq!(config.aspect_ratio, Some(1.0));
        assert_eq!(config.device_pixel_ratio, current_device_pixel_ratio());
    }

    #[wasm_bindgen_test]
    fn test_config_object_keeps_explicit_ratio() {
        let config = config_from_js(object(&[("devicePixelRatio", 3.0)])).unwrap();
        assert_eq!(config.device_pixel_ratio, 3.0);
    }

    #[wasm_bindgen_test]
    fn test_object_url_revoke_is_safe_to_repeat() {
        let registry = ObjectUrlRegistry;
        let handle = registry.create(&SourceFile::new("a.png", "image/png", vec![1u8, 2, 3]));
        assert!(handle.starts_with("blob:"));
        registry.revoke(&handle);
        registry.revoke(&handle);
        registry.revoke("not-a-url");
    }

    #[wasm_bindgen_test]
    fn test_missing_config_uses_screen_ratio() {
        let config = config_from_js(JsValue::UNDEFINED).unwrap();
        assert_eq!(config.device_pixel_ratio, current_device_pixel_ratio());
    }
}
