//! Agent configuration
//!
//! All values enter through the environment at the binary edge and are
//! passed into constructors explicitly; nothing below `main` reads env.

use std::path::PathBuf;
use std::time::Duration;

use tern_printer::DEFAULT_DEVICE_DIR;

/// Configuration for the print agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Label printing API base URL (including its path prefix)
    pub base_url: String,

    /// Pre-shared key for the label printing API
    pub api_key: String,

    /// Explicit printer device, skipping discovery
    pub device: Option<PathBuf>,

    /// Directory scanned for printer devices
    pub device_dir: PathBuf,

    /// Queue poll interval
    pub poll_interval: Duration,

    /// Per-request network timeout
    pub request_timeout: Duration,

    /// Default log level (overridden by RUST_LOG)
    pub log_level: String,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/admin/api/label-printing".into()),
            api_key: std::env::var("API_KEY").unwrap_or_default(),
            device: std::env::var("PRINTER_DEVICE").ok().map(PathBuf::from),
            device_dir: std::env::var("PRINTER_DEVICE_DIR")
                .unwrap_or_else(|_| DEFAULT_DEVICE_DIR.into())
                .into(),
            poll_interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
