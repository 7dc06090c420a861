//! reqwest-backed transport for the portfolio REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use tracing::{error, info};

use super::{
    error_message, parse_upload_response, Transport, TransportError, TransportResult, UploadKind,
    UploadPayload, UploadedFile,
};
use crate::config::TransportConfig;
use crate::storage::{KeyValueStore, ADMIN_TOKEN_KEY};

/// Multipart uploads over HTTP with an optional bearer token.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    store: Arc<dyn KeyValueStore>,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig, store: Arc<dyn KeyValueStore>) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            TransportError::Network(format!("Invalid API URL {}: {e}", config.api_base_url))
        })?;

        Ok(Self {
            client,
            base_url,
            store,
        })
    }

    /// Build `{api}/upload/{kind}[/{file_name}]`, percent-encoding each segment.
    fn build_url(&self, kind: UploadKind, file_name: Option<&str>) -> TransportResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::Network(format!("Invalid API URL {}", self.base_url)))?;
            segments.pop_if_empty().push("upload").push(kind.as_str());
            if let Some(name) = file_name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn token(&self) -> Option<String> {
        self.store.get(ADMIN_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_body(response: Response) -> TransportResult<(u16, String)> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(&self, kind: UploadKind, payload: UploadPayload) -> TransportResult<UploadedFile> {
        let url = self.build_url(kind, None)?;
        let size = payload.bytes.len();

        let part = Part::bytes(payload.bytes.to_vec())
            .file_name(payload.file_name.clone())
            .mime_str(&payload.mime_type)
            .map_err(|e| TransportError::Network(format!("Invalid MIME type: {e}")))?;
        let mut form = Form::new().part(kind.field_name(), part);
        for (name, value) in payload.fields {
            form = form.text(name, value);
        }

        let request = self
            .client
            .post(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form);
        let request = self.authorize(request);

        info!(
            url = %url,
            kind = kind.as_str(),
            file_name = %payload.file_name,
            size_bytes = size,
            "Uploading file"
        );

        let response = request.send().await.map_err(|e| {
            error!(error = %e, url = %url, "Upload request failed");
            TransportError::Network(e.to_string())
        })?;

        let (status, body) = Self::read_body(response).await.inspect_err(|e| {
            error!(error = %e, url = %url, "Upload rejected");
        })?;

        let uploaded = parse_upload_response(kind, &body).inspect_err(|e| {
            error!(error = %e, status, url = %url, "Upload not accepted");
        })?;

        info!(url = %uploaded.url, kind = kind.as_str(), "Upload completed");
        Ok(uploaded)
    }

    async fn delete(&self, kind: UploadKind, file_name: &str) -> TransportResult<()> {
        let url = self.build_url(kind, Some(file_name))?;
        let request = self.authorize(self.client.delete(url.clone()));

        info!(url = %url, kind = kind.as_str(), "Deleting file");

        let response = request.send().await.map_err(|e| {
            error!(error = %e, url = %url, "Delete request failed");
            TransportError::Network(e.to_string())
        })?;
        Self::read_body(response).await.inspect_err(|e| {
            error!(error = %e, url = %url, "Delete rejected");
        })?;
        Ok(())
    }
}
