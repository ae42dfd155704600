//! Print Job Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Print job lifecycle status
///
/// `InProgress` is client-local bookkeeping only; the service never sends
/// it. A job becomes `Completed` solely through an explicit completion
/// report after every label has been transmitted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states are owned by the remote service
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

/// Where a print job originated
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobOrigin {
    #[default]
    Procurement,
    Manual,
}

/// Job summary as returned by the pending listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub id: i64,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub source: JobOrigin,
    #[serde(default)]
    pub total_labels: u32,
    #[serde(default)]
    pub labels_printed: u32,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One SKU/variant line within a job
///
/// `qty_to_print` physical labels are emitted for this line. Prices are
/// integer minor units (cents) to keep printed amounts exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintItem {
    pub sku: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub variant_label: String,
    /// Price in minor units (e.g. cents)
    #[serde(default)]
    pub price_minor_units: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub code39_payload: String,
    #[serde(default)]
    pub qty_to_print: u32,
}

fn default_currency() -> String {
    "ZAR".to_string()
}

impl PrintItem {
    /// Barcode payload, falling back to the SKU when the service sent none
    pub fn effective_code39(&self) -> &str {
        if self.code39_payload.is_empty() {
            &self.sku
        } else {
            &self.code39_payload
        }
    }
}

/// A full print job: summary fields plus its ordered line items
///
/// Fetching the same pending job twice yields structurally identical
/// items; fetching never triggers printing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrintJob {
    pub id: i64,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub source: JobOrigin,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<PrintItem>,
}

impl PrintJob {
    /// Total physical labels this job will emit (zero-qty lines excluded)
    pub fn total_labels(&self) -> u32 {
        self.items.iter().map(|i| i.qty_to_print).sum()
    }
}
