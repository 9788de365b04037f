use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use crate::error::ExportError;

/// Text the export endpoint embeds in its body when it failed to assemble the data.
pub const UPSTREAM_ERROR_SENTINEL: &str = "Error loading data for db Export";

const REQUEST_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Transport to the service that assembles export payloads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Forwards the raw message body and returns the response body.
    ///
    /// Only transport failures are errors here; the caller decides whether
    /// the body is usable.
    async fn fetch_export(&self, message: &str) -> Result<String, ExportError>;
}

pub fn is_upstream_error(body: &str) -> bool {
    body.contains(UPSTREAM_ERROR_SENTINEL)
}

pub struct HttpExportSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpExportSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExportSource for HttpExportSource {
    async fn fetch_export(&self, message: &str) -> Result<String, ExportError> {
        info!("Accessing export endpoint: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .body(message.to_string())
            .send()
            .await
            .map_err(|e| ExportError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Export endpoint responded with status {}", status);
        }

        response
            .text()
            .await
            .map_err(|e| ExportError::UpstreamUnavailable(e.to_string()))
    }
}
