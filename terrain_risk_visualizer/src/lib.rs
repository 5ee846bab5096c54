// Presentation layer for the terrain risk engine.
//
// Always available: histogram chart rendering (`chart`) and the serializable
// `AnalysisSummary`. With the `web` feature the crate also provides the axum
// front end: leptos-rendered pages, an upload form that accepts a link or a
// file, a result page, stored-upload serving and a JSON endpoint.

use std::path::PathBuf;
use std::time::Duration;

pub mod chart;
pub mod summary;
#[cfg(feature = "web")]
pub mod page;
#[cfg(feature = "web")]
pub mod server;
#[cfg(feature = "web")]
pub mod upload;

pub use summary::AnalysisSummary;

const DEFAULT_BIND: &str = "127.0.0.1:3001";
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_CREATOR: &str = "Rakhim";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Directory that receives uploaded and downloaded images.
    pub upload_dir: PathBuf,
    /// Largest accepted image, for both uploaded files and fetched links.
    pub max_upload_bytes: usize,
    /// Deadline for fetching an image link, connect to last byte.
    pub fetch_timeout: Duration,
    /// Name shown in the index page footer.
    pub creator: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            creator: DEFAULT_CREATOR.to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads `TR_BIND`, `TR_UPLOAD_DIR`, `TR_MAX_UPLOAD_BYTES`,
    /// `TR_FETCH_TIMEOUT_SECS` and `TR_CREATOR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; empty or unparsable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = value("TR_BIND") {
            cfg.bind_addr = bind;
        }
        if let Some(dir) = value("TR_UPLOAD_DIR") {
            cfg.upload_dir = PathBuf::from(dir);
        }
        if let Some(limit) = value("TR_MAX_UPLOAD_BYTES") {
            match limit.trim().parse::<usize>() {
                Ok(bytes) => cfg.max_upload_bytes = bytes,
                Err(error) => tracing::warn!(%limit, %error, "ignoring TR_MAX_UPLOAD_BYTES"),
            }
        }
        if let Some(secs) = value("TR_FETCH_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => cfg.fetch_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(%secs, "ignoring TR_FETCH_TIMEOUT_SECS"),
            }
        }
        if let Some(creator) = value("TR_CREATOR") {
            cfg.creator = creator;
        }
        cfg
    }
}

#[cfg(feature = "web")]
pub use server::{AppState, router, start_server};

#[cfg(not(feature = "web"))]
pub async fn start_server(_cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Err(anyhow::anyhow!("web feature not enabled for terrain_risk_visualizer"))
}
