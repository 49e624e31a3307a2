use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use vision_relay_core::RelayError;
use vision_relay_store::{StoreError, TempUpload, UploadDir};

use super::AppState;

/// Multipart field that carries the image.
pub const IMAGE_FIELD: &str = "image";

pub fn routes() -> Router<AppState> {
    Router::new().route("/anotate", post(annotate))
}

/// Spool the uploaded image, send it for annotation, relay the result.
///
/// The upload guard lives for the whole handler, so the file is removed on
/// every return path, including when the client goes away mid-request.
async fn annotate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let mut multipart = multipart.map_err(|e| {
        debug!("not a multipart upload: {e}");
        to_error(RelayError::NoImage)
    })?;

    let upload = receive_image(&state.uploads, &mut multipart)
        .await
        .map_err(to_error)?;

    let image = upload
        .read()
        .await
        .map_err(|e| to_error(RelayError::ReadUpload(e.to_string())))?;

    let body = state
        .annotator
        .annotate(image)
        .await
        .map_err(|e| to_error(e.into()))?;

    info!(
        image_bytes = upload.size(),
        response_bytes = body.len(),
        "annotated upload"
    );
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Walk the multipart body and spool the single `image` file part.
///
/// Text parts and files under other names are skipped. A body that runs past
/// the configured limit is reported as `TooLarge`, whether the limit trips
/// between parts or inside the image part.
async fn receive_image(
    uploads: &UploadDir,
    multipart: &mut Multipart,
) -> Result<TempUpload, RelayError> {
    let mut image: Option<TempUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                warn!("upload over size limit: {e}");
                return Err(RelayError::TooLarge(e.body_text()));
            }
            Err(e) => {
                warn!("malformed multipart body: {e}");
                return Err(RelayError::NoImage);
            }
        };

        if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
            debug!(field = ?field.name(), "skipping multipart field");
            continue;
        }
        if image.is_some() {
            return Err(RelayError::MultipleImages);
        }

        let file_name = field.file_name().map(str::to_string);
        let upload = uploads
            .spool(
                IMAGE_FIELD,
                file_name.as_deref(),
                field.map(|chunk| chunk.map_err(chunk_error)),
            )
            .await
            .map_err(|e| match e {
                StoreError::TooLarge(detail) => {
                    warn!("upload over size limit: {detail}");
                    RelayError::TooLarge(detail)
                }
                StoreError::Stream(detail) => {
                    warn!("upload interrupted: {detail}");
                    RelayError::NoImage
                }
                StoreError::Io(detail) => RelayError::ReadUpload(detail),
            })?;
        image = Some(upload);
    }

    image.ok_or(RelayError::NoImage)
}

fn chunk_error(e: MultipartError) -> StoreError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StoreError::TooLarge(e.body_text())
    } else {
        StoreError::Stream(e.body_text())
    }
}

fn to_error(e: RelayError) -> (StatusCode, Json<Value>) {
    let status = match e {
        RelayError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        _ if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => {
            error!("annotate failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": e.public_message() })))
}
