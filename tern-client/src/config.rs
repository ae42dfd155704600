//! Job source client configuration

use std::time::Duration;

/// Configuration for connecting to the inventory service
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Service base URL including the label-printing API prefix
    /// (e.g. "http://localhost:8000/admin/api/label-printing")
    pub base_url: String,

    /// Static pre-shared key sent on every request
    pub api_key: String,

    /// Request timeout; a timeout surfaces as `SourceError::Unreachable`
    pub timeout: Duration,
}

impl SourceConfig {
    /// Create a new configuration with the default timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
