//! Shared types for the Tern label printing engine
//!
//! Wire-level data model exchanged with the inventory service plus the
//! money formatting helpers used when rendering labels. No printer or
//! network knowledge lives here.

pub mod models;
pub mod price;

// Re-exports
pub use models::{JobOrigin, JobStatus, JobSummary, PrintItem, PrintJob};
pub use price::format_minor_units;
