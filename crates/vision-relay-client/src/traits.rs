use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use vision_relay_core::RelayError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The annotation API answered but reported an error in its body.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The call did not complete with a 2xx response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ClientError> for RelayError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Upstream(detail) => RelayError::Upstream(detail),
            ClientError::Transport(detail) => RelayError::Transport(detail),
        }
    }
}

/// Sends one image to an annotation backend.
///
/// `VisionClient` talks to the real API over HTTPS. Tests substitute
/// in-process stubs.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Annotate `image` and return the backend's response body untouched.
    async fn annotate(&self, image: Bytes) -> Result<Bytes, ClientError>;
}
