use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use vision_relay_client::DEFAULT_ENDPOINT;
use vision_relay_store::DEFAULT_UPLOAD_DIR;

/// Default multipart body limit: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Parser)]
#[command(
    name = "vision-relay-server",
    about = "Relay uploaded images to the Cloud Vision annotate API"
)]
pub struct ServerConfig {
    /// Sole browser origin allowed to call the API
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Cloud Vision API key, sent as the `key` query parameter
    #[arg(long, env = "GOOGLE_VISION_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Directory that holds uploads while they are being processed
    #[arg(long, env = "UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
    pub upload_dir: PathBuf,

    /// Annotation endpoint URL
    #[arg(long, env = "VISION_API_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub vision_endpoint: String,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// The configured frontend origin, without a trailing slash.
    /// Blank values count as unset.
    pub fn allowed_origin(&self) -> Option<String> {
        self.frontend_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-backed defaults are read from the process environment, so every
    // scenario runs under one lock with the relevant vars cleared.
    fn with_clean_env<F: FnOnce()>(f: F) {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();
        for var in [
            "FRONTEND_URL",
            "GOOGLE_VISION_API_KEY",
            "PORT",
            "BIND_ADDR",
            "UPLOAD_DIR",
            "VISION_API_ENDPOINT",
            "MAX_UPLOAD_BYTES",
        ] {
            std::env::remove_var(var);
        }
        f();
    }

    #[test]
    fn defaults_apply() {
        with_clean_env(|| {
            let config = ServerConfig::try_parse_from(["vision-relay-server", "--api-key", "k"])
                .unwrap();
            assert_eq!(config.port, 3001);
            assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3001");
            assert_eq!(config.upload_dir, PathBuf::from("uploads"));
            assert_eq!(
                config.vision_endpoint,
                "https://vision.googleapis.com/v1/images:annotate"
            );
            assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
            assert!(config.frontend_url.is_none());
            assert!(config.allowed_origin().is_none());
        });
    }

    #[test]
    fn api_key_is_required() {
        with_clean_env(|| {
            assert!(ServerConfig::try_parse_from(["vision-relay-server"]).is_err());
        });
    }

    #[test]
    fn env_vars_are_read() {
        with_clean_env(|| {
            std::env::set_var("FRONTEND_URL", "https://app.example.com");
            std::env::set_var("GOOGLE_VISION_API_KEY", "env-key");
            std::env::set_var("PORT", "8080");
            let config = ServerConfig::try_parse_from(["vision-relay-server"]).unwrap();
            assert_eq!(config.api_key, "env-key");
            assert_eq!(config.port, 8080);
            assert_eq!(
                config.allowed_origin().as_deref(),
                Some("https://app.example.com")
            );
            std::env::remove_var("FRONTEND_URL");
            std::env::remove_var("GOOGLE_VISION_API_KEY");
            std::env::remove_var("PORT");
        });
    }

    #[test]
    fn allowed_origin_normalization() {
        with_clean_env(|| {
            let parse = |url: &str| {
                ServerConfig::try_parse_from([
                    "vision-relay-server",
                    "--api-key",
                    "k",
                    "--frontend-url",
                    url,
                ])
                .unwrap()
                .allowed_origin()
            };
            assert_eq!(
                parse("http://localhost:3000/").as_deref(),
                Some("http://localhost:3000")
            );
            assert_eq!(parse("   "), None);
        });
    }
}
