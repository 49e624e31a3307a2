mod upload;

pub use upload::{TempUpload, UploadDir};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("upload stream error: {0}")]
    Stream(String),

    #[error("upload exceeds size limit: {0}")]
    TooLarge(String),
}

/// Default directory for in-flight uploads, relative to the working directory.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
