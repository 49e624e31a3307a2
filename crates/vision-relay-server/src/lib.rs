pub mod config;
pub mod cors;
pub mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use vision_relay_client::VisionClient;
use vision_relay_store::UploadDir;

use config::ServerConfig;
use routes::InnerAppState;

pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let uploads = UploadDir::new(&config.upload_dir);
    uploads.ensure().await?;
    info!("uploads spooled under {}", uploads.base_dir().display());

    let annotator = Arc::new(VisionClient::new(
        &config.vision_endpoint,
        config.api_key.clone(),
    ));
    let state = Arc::new(InnerAppState {
        annotator,
        uploads,
        allowed_origin: config.allowed_origin(),
    });
    let app = routes::build_router(state, config.max_upload_bytes);
    axum::serve(listener, app).await?;
    Ok(())
}
