//! Transport adapter
//!
//! The coordinator only sees the [`Transport`] trait. The HTTP implementation
//! lives behind the `http` feature so the wasm build can supply its own.
//!
//! Every failure (network, non-2xx, a `status` other than `"success"`,
//! undecodable bodies) surfaces as a [`TransportError`]. There is no retry.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpTransport;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status value the backend uses for accepted uploads.
pub const STATUS_SUCCESS: &str = "success";

/// Transport operation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered but refused the upload.
    #[error("{0}")]
    Rejected(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Upload endpoints of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Image,
    Certificate,
    Resume,
}

impl UploadKind {
    /// Path segment under `/upload`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Image => "image",
            UploadKind::Certificate => "certificate",
            UploadKind::Resume => "resume",
        }
    }

    /// Path relative to the API base, e.g. `/upload/image`.
    pub fn path(&self) -> String {
        format!("/upload/{}", self.as_str())
    }

    /// Multipart field the file is sent under.
    pub fn field_name(&self) -> &'static str {
        self.as_str()
    }
}

/// One file plus any extra form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPayload {
    pub bytes: Arc<[u8]>,
    pub file_name: String,
    pub mime_type: String,
    /// Extra text fields, e.g. `title` and `designation` for resumes.
    pub fields: Vec<(String, String)>,
}

impl UploadPayload {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            fields: Vec::new(),
        }
    }

    /// Add a text field. Empty values are skipped.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.fields.push((name.into(), value));
        }
        self
    }
}

/// What the coordinator needs to know about a stored file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// URL as returned by the server, possibly relative.
    pub url: String,
    pub filename: Option<String>,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    /// Raw record for endpoints that return more than a file (resumes).
    pub data: Option<serde_json::Value>,
}

impl UploadedFile {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Transport abstraction
///
/// Implementations must resolve every call; the coordinator does not retry
/// and does not impose its own timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Upload one file to the endpoint for `kind`.
    async fn upload(&self, kind: UploadKind, payload: UploadPayload) -> TransportResult<UploadedFile>;

    /// Delete a previously uploaded file by its stored name.
    async fn delete(&self, kind: UploadKind, file_name: &str) -> TransportResult<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn upload(&self, kind: UploadKind, payload: UploadPayload) -> TransportResult<UploadedFile> {
        (**self).upload(kind, payload).await
    }

    async fn delete(&self, kind: UploadKind, file_name: &str) -> TransportResult<()> {
        (**self).delete(kind, file_name).await
    }
}

/// Body of `POST /upload/image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub status: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// File record inside a certificate upload response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFile {
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Body of `POST /upload/certificate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateUploadResponse {
    pub status: String,
    #[serde(default)]
    pub file: Option<CertificateFile>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /upload/resume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeUploadResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body shape shared by all endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

fn rejected(message: Option<String>) -> TransportError {
    TransportError::Rejected(message.unwrap_or_else(|| "Upload failed".to_string()))
}

impl ImageUploadResponse {
    pub fn into_uploaded(self) -> TransportResult<UploadedFile> {
        if self.status != STATUS_SUCCESS {
            return Err(rejected(self.message));
        }
        self.image_url
            .filter(|url| !url.is_empty())
            .map(UploadedFile::from_url)
            .ok_or_else(|| TransportError::InvalidResponse("missing imageUrl".to_string()))
    }
}

impl CertificateUploadResponse {
    pub fn into_uploaded(self) -> TransportResult<UploadedFile> {
        if self.status != STATUS_SUCCESS {
            return Err(rejected(self.message));
        }
        let file = self
            .file
            .ok_or_else(|| TransportError::InvalidResponse("missing file".to_string()))?;
        Ok(UploadedFile {
            url: file.url,
            filename: file.filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: file.size,
            data: None,
        })
    }
}

impl ResumeUploadResponse {
    pub fn into_uploaded(self) -> TransportResult<UploadedFile> {
        if self.status != STATUS_SUCCESS {
            return Err(rejected(self.message));
        }
        let data = self.data.unwrap_or(serde_json::Value::Null);
        let field = |name: &str| data.get(name).and_then(|v| v.as_str()).map(str::to_string);
        Ok(UploadedFile {
            url: field("url").unwrap_or_default(),
            filename: field("filename"),
            original_name: field("originalName"),
            mime_type: field("mimeType"),
            size: data.get("size").and_then(|v| v.as_u64()),
            data: Some(data),
        })
    }
}

/// Decode a 2xx response body for `kind`.
pub fn parse_upload_response(kind: UploadKind, body: &str) -> TransportResult<UploadedFile> {
    let invalid = |e: serde_json::Error| TransportError::InvalidResponse(e.to_string());
    match kind {
        UploadKind::Image => serde_json::from_str::<ImageUploadResponse>(body)
            .map_err(invalid)?
            .into_uploaded(),
        UploadKind::Certificate => serde_json::from_str::<CertificateUploadResponse>(body)
            .map_err(invalid)?
            .into_uploaded(),
        UploadKind::Resume => serde_json::from_str::<ResumeUploadResponse>(body)
            .map_err(invalid)?
            .into_uploaded(),
    }
}

/// Message for a non-2xx response: the body's `message`, or a generic one.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| "Something went wrong".to_string())
}
