//! Observable print progress
//!
//! The orchestrator publishes the latest progress on a watch channel; any
//! presentation layer renders it however it likes.

use serde::Serialize;

/// Phase of the job currently in flight
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrintPhase {
    #[default]
    Idle,
    Calibrating,
    Printing,
    Reporting,
    Done,
    Failed,
}

/// Latest print progress snapshot
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PrintProgress {
    pub job_id: Option<i64>,
    pub labels_printed: u32,
    pub labels_total: u32,
    pub phase: PrintPhase,
}

impl PrintProgress {
    /// Progress value before any job has run
    pub fn idle() -> Self {
        Self::default()
    }
}
