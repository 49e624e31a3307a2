use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use vision_relay_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();

    match config.allowed_origin() {
        Some(origin) => info!("CORS origin: {origin}"),
        None => warn!("FRONTEND_URL not set; browser requests will be refused"),
    }
    info!("annotation endpoint: {}", config.vision_endpoint);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Server is running on port {}", addr.port());

    vision_relay_server::serve(listener, config).await?;
    Ok(())
}
