//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// No printer attached, or the device node is not writable
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Device fault mid-print (partial write, broken pipe)
    #[error("Transport write failed: {0}")]
    TransportWrite(String),

    /// IO error outside the write path
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
