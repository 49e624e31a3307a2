use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::StoreError;

/// Directory that holds uploads for the lifetime of their request.
#[derive(Debug, Clone)]
pub struct UploadDir {
    base_dir: PathBuf,
}

impl UploadDir {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the directory if it does not exist yet.
    pub async fn ensure(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| StoreError::Io(format!("mkdir {}: {e}", self.base_dir.display())))
    }

    /// Write a streamed upload to a freshly named file in this directory.
    ///
    /// The returned guard owns the file. If writing fails, the guard is
    /// dropped before returning and the partial file goes with it. Stream
    /// errors are passed through as-is so callers can tell a body that hit
    /// the size limit from one that was cut off.
    pub async fn spool<S>(
        &self,
        field_name: &str,
        file_name: Option<&str>,
        chunks: S,
    ) -> Result<TempUpload, StoreError>
    where
        S: Stream<Item = Result<Bytes, StoreError>>,
    {
        let path = self.base_dir.join(Uuid::new_v4().simple().to_string());
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| StoreError::Io(format!("create {}: {e}", path.display())))?;

        let mut upload = TempUpload {
            path,
            field_name: field_name.to_string(),
            file_name: file_name.map(str::to_string),
            size: 0,
        };

        let mut chunks = std::pin::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| StoreError::Io(format!("write {}: {e}", upload.path.display())))?;
            upload.size += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| StoreError::Io(format!("flush {}: {e}", upload.path.display())))?;

        debug!(
            path = %upload.path.display(),
            field = %upload.field_name,
            size = upload.size,
            "spooled upload"
        );
        Ok(upload)
    }
}

/// An uploaded file on disk, removed when this value goes out of scope.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    field_name: String,
    file_name: Option<String>,
    size: u64,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Filename the client sent, if any. Never used to build a path.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole file into memory.
    pub async fn read(&self) -> Result<Bytes, StoreError> {
        tokio::fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|e| StoreError::Io(format!("read {}: {e}", self.path.display())))
    }
}

// `Drop` cannot await, so the unlink is synchronous. A single unlink is short
// enough to run on the runtime thread, and it still happens when the handler
// future is cancelled.
impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "upload already removed")
            }
            Err(e) => warn!(path = %self.path.display(), "failed to delete uploaded file: {e}"),
        }
    }
}
