use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};
use vision_relay_core::{upstream_error, BatchAnnotateImagesRequest};

use crate::{Annotator, ClientError};

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Async HTTP client for the `images:annotate` endpoint.
///
/// The API key travels as the `key` query parameter. One attempt per call,
/// no client-side timeout.
pub struct VisionClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl VisionClient {
    pub fn new(endpoint: &str, api_key: String) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Annotator for VisionClient {
    async fn annotate(&self, image: Bytes) -> Result<Bytes, ClientError> {
        let payload = BatchAnnotateImagesRequest::for_image(&image);
        debug!(endpoint = %self.endpoint, image_bytes = image.len(), "calling annotation API");

        // `without_url` keeps the key out of error strings.
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("send: {}", e.without_url())))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("read body: {}", e.without_url())))?;

        if !status.is_success() {
            warn!(%status, "annotation API returned non-success status");
            return Err(ClientError::Transport(format!("status {status}")));
        }

        if let Some(err) = upstream_error(&body) {
            warn!("annotation API error: {err}");
            return Err(ClientError::Upstream(err.to_string()));
        }

        Ok(body)
    }
}
