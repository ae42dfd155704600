//! Job source error types

use thiserror::Error;

/// Job source error type
///
/// `Unreachable` and `Auth` are deliberately distinct: the first means
/// retry on the next poll tick, the second means the deployment is
/// misconfigured and retrying with the same key will never succeed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure or timeout
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    /// The service rejected the pre-shared key
    #[error("Source rejected the API key")]
    Auth,

    /// Job no longer exists remotely (cancelled by another operator)
    #[error("Job not found: {0}")]
    JobNotFound(i64),

    /// Response did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for job source operations
pub type SourceResult<T> = Result<T, SourceError>;
