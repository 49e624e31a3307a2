use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use tempfile::TempDir;
use tokio::net::TcpListener;
use vision_relay_client::{Annotator, ClientError};
use vision_relay_store::UploadDir;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::routes::{build_router, AppState, InnerAppState};

/// Origin the test routers accept.
pub const TEST_ORIGIN: &str = "http://localhost:3000";

enum Outcome {
    Ok(Bytes),
    Upstream(String),
    Transport(String),
}

struct StubInner {
    outcome: Outcome,
    calls: AtomicUsize,
    last_image: Mutex<Option<Bytes>>,
    watch_dir: Mutex<Option<PathBuf>>,
    seen_during_call: Mutex<Option<usize>>,
}

/// In-process `Annotator` with a canned outcome that records what it was sent.
#[derive(Clone)]
pub struct StubAnnotator {
    inner: Arc<StubInner>,
}

impl StubAnnotator {
    fn new(outcome: Outcome) -> Self {
        Self {
            inner: Arc::new(StubInner {
                outcome,
                calls: AtomicUsize::new(0),
                last_image: Mutex::new(None),
                watch_dir: Mutex::new(None),
                seen_during_call: Mutex::new(None),
            }),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(Outcome::Ok(Bytes::copy_from_slice(body.as_bytes())))
    }

    pub fn upstream_error(detail: &str) -> Self {
        Self::new(Outcome::Upstream(detail.to_string()))
    }

    pub fn transport_error(detail: &str) -> Self {
        Self::new(Outcome::Transport(detail.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn last_image(&self) -> Option<Bytes> {
        self.inner.last_image.lock().unwrap().clone()
    }

    /// Number of files in the upload directory at the time of the last call.
    pub fn uploads_seen_during_call(&self) -> Option<usize> {
        *self.inner.seen_during_call.lock().unwrap()
    }

    fn watch(&self, dir: &Path) {
        *self.inner.watch_dir.lock().unwrap() = Some(dir.to_path_buf());
    }
}

#[async_trait]
impl Annotator for StubAnnotator {
    async fn annotate(&self, image: Bytes) -> Result<Bytes, ClientError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        *self.inner.last_image.lock().unwrap() = Some(image);
        let watched = self.inner.watch_dir.lock().unwrap().clone();
        if let Some(dir) = watched {
            *self.inner.seen_during_call.lock().unwrap() = Some(upload_count(&dir));
        }
        match &self.inner.outcome {
            Outcome::Ok(body) => Ok(body.clone()),
            Outcome::Upstream(detail) => Err(ClientError::Upstream(detail.clone())),
            Outcome::Transport(detail) => Err(ClientError::Transport(detail.clone())),
        }
    }
}

fn test_state(annotator: Arc<dyn Annotator>, uploads: &TempDir) -> AppState {
    Arc::new(InnerAppState {
        annotator,
        uploads: UploadDir::new(uploads.path()),
        allowed_origin: Some(TEST_ORIGIN.to_string()),
    })
}

/// Build a test router around `stub`, with a fresh upload directory.
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn test_router(stub: StubAnnotator) -> (Router, TempDir) {
    test_router_with_limit(stub, DEFAULT_MAX_UPLOAD_BYTES)
}

/// Like [`test_router`], with a custom request body limit.
pub fn test_router_with_limit(stub: StubAnnotator, max_upload_bytes: usize) -> (Router, TempDir) {
    let uploads = tempfile::tempdir().unwrap();
    stub.watch(uploads.path());
    let state = test_state(Arc::new(stub), &uploads);
    (build_router(state, max_upload_bytes), uploads)
}

/// Count files left in an upload directory.
pub fn upload_count(dir: impl AsRef<Path>) -> usize {
    std::fs::read_dir(dir.as_ref()).unwrap().count()
}

/// One part of a hand-built multipart body.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, file_name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            data: value.as_bytes(),
        }
    }
}

/// Encode `parts` as `multipart/form-data`. Returns (content type, body).
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "vision-relay-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub uploads: TempDir,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn the relay on a random port in front of `annotator`.
pub async fn spawn_test_server(annotator: Arc<dyn Annotator>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let uploads = tempfile::tempdir().unwrap();
    let app = build_router(test_state(annotator, &uploads), DEFAULT_MAX_UPLOAD_BYTES);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        uploads,
        _handle: handle,
    }
}
