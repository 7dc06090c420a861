//! Configuration for the upload control and the HTTP transport.
//!
//! Both structs deserialize from JSON (or any serde format) with every field
//! optional; missing fields take the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::OutputFormat;
use crate::geometry::CropConstraints;

/// Default maximum upload size: 15 MiB, matching the backend limit.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 15 * 1024 * 1024;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_SERVER_BASE_URL: &str = "http://localhost:5001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Shape of the crop overlay. The extracted buffer is always rectangular;
/// `Round` only changes how the selection is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropShape {
    #[default]
    Round,
    Rect,
}

/// Settings for one upload control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadConfig {
    /// Width over height; `None` for free-form crops.
    pub aspect_ratio: Option<f64>,
    pub crop_shape: CropShape,
    pub min_width: f64,
    pub min_height: f64,
    pub max_file_bytes: u64,
    /// When false, validated files go straight to upload.
    pub cropping_enabled: bool,
    /// Display density used to size the extracted buffer.
    pub device_pixel_ratio: f64,
    pub output_format: OutputFormat,
    /// Quality for lossy output formats (1-100).
    pub quality: u8,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: Some(1.0),
            crop_shape: CropShape::Round,
            min_width: 200.0,
            min_height: 200.0,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            cropping_enabled: true,
            device_pixel_ratio: 1.0,
            output_format: OutputFormat::Png,
            quality: 100,
        }
    }
}

impl UploadConfig {
    pub fn constraints(&self) -> CropConstraints {
        CropConstraints {
            aspect_ratio: self.aspect_ratio,
            min_width: self.min_width,
            min_height: self.min_height,
        }
    }

    /// Reject values no control can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ratio) = self.aspect_ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(ConfigError::InvalidValue {
                    name: "aspectRatio",
                    value: ratio.to_string(),
                });
            }
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(ConfigError::InvalidValue {
                name: "devicePixelRatio",
                value: self.device_pixel_ratio.to_string(),
            });
        }
        if self.min_width < 0.0 || self.min_height < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "minWidth/minHeight",
                value: format!("{}x{}", self.min_width, self.min_height),
            });
        }
        Ok(())
    }
}

/// Where uploads go and how long they may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportConfig {
    /// Base of the REST API, e.g. `http://localhost:5001/api`.
    pub api_base_url: String,
    /// Base that relative upload paths are resolved against.
    pub server_base_url: String,
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            server_base_url: DEFAULT_SERVER_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TransportConfig {
    /// Read FOLIO_API_URL, FOLIO_SERVER_URL and FOLIO_UPLOAD_TIMEOUT_SECS,
    /// falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`TransportConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("FOLIO_API_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = lookup("FOLIO_SERVER_URL") {
            config.server_base_url = url;
        }
        if let Some(raw) = lookup("FOLIO_UPLOAD_TIMEOUT_SECS") {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "FOLIO_UPLOAD_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{api_base_url}{path}` with a single slash between them.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
