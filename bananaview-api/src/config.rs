//! API Configuration Module
//!
//! Server-level settings: bind address, optional frontend serving, and
//! the translation-table locations. Loaded from environment variables
//! with defaults matching the observed deployment; the `--serve` CLI
//! flag overrides `serve_frontend` at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9178;

/// Default dictionary source for the translation table.
pub const DEFAULT_WORDS_URL: &str = "http://dataset.genshin-dictionary.com/words.json";

/// API configuration for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to bind.
    pub port: u16,

    /// Whether to also serve the companion frontend (`/` and `/static`).
    pub serve_frontend: bool,

    /// Directory holding static assets, the cache snapshot, and the
    /// translation tables.
    pub static_dir: PathBuf,

    /// Directory holding `index.html` when frontend serving is enabled.
    pub frontend_dir: PathBuf,

    /// Remote source of the default translation table.
    pub words_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            serve_frontend: false,
            static_dir: PathBuf::from("static"),
            frontend_dir: PathBuf::from("."),
            words_url: DEFAULT_WORDS_URL.to_string(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `BANANAVIEW_BIND`: interface to bind (default: 0.0.0.0)
    /// - `PORT` / `BANANAVIEW_PORT`: port to bind (default: 9178)
    /// - `BANANAVIEW_SERVE_FRONTEND`: "true" or "false" (default: false)
    /// - `BANANAVIEW_STATIC_DIR`: static asset directory (default: static)
    /// - `BANANAVIEW_FRONTEND_DIR`: directory of index.html (default: .)
    /// - `BANANAVIEW_WORDS_URL`: translation-table source URL
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host = std::env::var("BANANAVIEW_BIND").unwrap_or(defaults.bind_host);

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("BANANAVIEW_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let serve_frontend = std::env::var("BANANAVIEW_SERVE_FRONTEND")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let static_dir = std::env::var("BANANAVIEW_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let frontend_dir = std::env::var("BANANAVIEW_FRONTEND_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.frontend_dir);

        let words_url = std::env::var("BANANAVIEW_WORDS_URL").unwrap_or(defaults.words_url);

        Self {
            bind_host,
            port,
            serve_frontend,
            static_dir,
            frontend_dir,
            words_url,
        }
    }

    /// Resolve the socket address to bind.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }
}
