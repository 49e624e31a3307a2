pub mod annotate;
pub mod health;

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::trace::TraceLayer;
use vision_relay_client::Annotator;
use vision_relay_store::UploadDir;

use crate::cors::{cors_layer, origin_gate};

pub struct InnerAppState {
    pub annotator: Arc<dyn Annotator>,
    pub uploads: UploadDir,
    /// Normalized `FRONTEND_URL`; `None` refuses every browser origin.
    pub allowed_origin: Option<String>,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = cors_layer(state.allowed_origin.as_deref());

    Router::new()
        .merge(health::routes())
        .merge(annotate::routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        // Outermost after tracing, so foreign preflights never reach the CORS layer.
        .layer(middleware::from_fn_with_state(state.clone(), origin_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
