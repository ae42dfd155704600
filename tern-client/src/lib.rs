//! # tern-client
//!
//! HTTP client for the inventory service's label printing API.
//!
//! Pure network boundary: lists pending print jobs, fetches job detail,
//! reports completion. Authenticates with a static pre-shared key header.
//! Knows nothing about printers.

pub mod config;
pub mod error;
pub mod http;

pub use config::SourceConfig;
pub use error::{SourceError, SourceResult};
pub use http::{HttpJobSource, JobSource};

// Re-export shared types for convenience
pub use shared::{JobStatus, JobSummary, PrintItem, PrintJob};
