//! Agent error types

use tern_client::SourceError;
use tern_printer::PrintError;
use thiserror::Error;

/// Agent error type
///
/// Transport and source failures stop at this boundary; they surface as
/// operator-visible status and log entries, never as a process exit.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Another print action is holding the transport
    #[error("A print action is already in progress")]
    Busy,

    /// No printer selected for this session
    #[error("No printer selected")]
    NoPrinter,

    /// Job source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Printer transport failure
    #[error(transparent)]
    Print(#[from] PrintError),
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
