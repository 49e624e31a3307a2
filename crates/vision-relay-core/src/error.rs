use thiserror::Error;

/// Failures of one annotate request, as seen by the caller.
///
/// The inner strings are diagnostic detail for logs. Callers only ever see
/// [`RelayError::public_message`].
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no image uploaded")]
    NoImage,

    #[error("more than one image in upload")]
    MultipleImages,

    #[error("upload too large: {0}")]
    TooLarge(String),

    #[error("read upload: {0}")]
    ReadUpload(String),

    #[error("annotation API error: {0}")]
    Upstream(String),

    #[error("annotation API request failed: {0}")]
    Transport(String),
}

impl RelayError {
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::NoImage => "No image uploaded",
            RelayError::MultipleImages => "Only one image may be uploaded",
            RelayError::TooLarge(_) => "Image exceeds the upload size limit",
            RelayError::ReadUpload(_) => "Error reading the image file",
            RelayError::Upstream(_) => "Vision API processing failed",
            RelayError::Transport(_) => "Error processing image with Vision API",
        }
    }

    /// True when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::NoImage | RelayError::MultipleImages | RelayError::TooLarge(_)
        )
    }
}
