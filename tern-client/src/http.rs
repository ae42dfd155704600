//! HTTP job source client

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::{JobSummary, PrintJob};
use tracing::{debug, instrument, warn};

use crate::config::SourceConfig;
use crate::error::{SourceError, SourceResult};

/// Header carrying the static pre-shared key
const API_KEY_HEADER: &str = "X-API-Key";

/// Trait for job sources
///
/// The print agent is generic over this seam so tests can drive it with a
/// scripted fake instead of a live service.
#[allow(async_fn_in_trait)]
pub trait JobSource {
    /// List pending print jobs
    async fn list_pending(&self) -> SourceResult<Vec<JobSummary>>;

    /// Fetch one job with its items. Re-fetching an unchanged job yields a
    /// structurally identical result; fetching never triggers printing.
    async fn get_job(&self, id: i64) -> SourceResult<PrintJob>;

    /// Report a job fully printed. Safe to call more than once for the
    /// same id; the service owns terminal state.
    async fn report_complete(&self, id: i64) -> SourceResult<()>;
}

/// Job detail envelope returned by `GET <base>/request/{id}`
#[derive(Debug, Deserialize)]
struct JobDetail {
    request: JobSummary,
    #[serde(default)]
    items: Vec<shared::PrintItem>,
}

impl JobDetail {
    fn into_job(self) -> PrintJob {
        PrintJob {
            id: self.request.id,
            status: self.request.status,
            source: self.request.source,
            note: self.request.note,
            created_by: self.request.created_by,
            created_at: self.request.created_at,
            items: self.items,
        }
    }
}

/// Completion report body for `POST <base>/complete`
#[derive(Debug, serde::Serialize)]
struct CompleteRequest {
    request_id: i64,
}

/// HTTP client for the label printing API
#[derive(Debug, Clone)]
pub struct HttpJobSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpJobSource {
    /// Create a new client from configuration
    pub fn new(config: &SourceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Probe connectivity and credentials without touching any job
    pub async fn ping(&self) -> SourceResult<()> {
        self.list_pending().await.map(|_| ())
    }
}

/// Map a reqwest transport failure into the source taxonomy
fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_decode() {
        SourceError::InvalidResponse(e.to_string())
    } else {
        SourceError::Unreachable(e.to_string())
    }
}

/// Map a non-success status shared by every endpoint
fn status_error(status: StatusCode) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth,
        other => SourceError::Unreachable(format!("unexpected status {}", other)),
    }
}

/// Whether a completion report answer means the job is already terminal.
/// The service owns terminal state, so repeating a report is success.
fn report_already_terminal(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::CONFLICT
}

impl JobSource for HttpJobSource {
    #[instrument(skip(self))]
    async fn list_pending(&self) -> SourceResult<Vec<JobSummary>> {
        let response = self
            .client
            .get(self.url("pending"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let summaries: Vec<JobSummary> = response.json().await.map_err(transport_error)?;
        debug!(count = summaries.len(), "pending jobs listed");
        Ok(summaries)
    }

    #[instrument(skip(self))]
    async fn get_job(&self, id: i64) -> SourceResult<PrintJob> {
        let response = self
            .client
            .get(self.url(&format!("request/{}", id)))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::JobNotFound(id));
        }
        if !status.is_success() {
            return Err(status_error(status));
        }

        let detail: JobDetail = response.json().await.map_err(transport_error)?;
        Ok(detail.into_job())
    }

    #[instrument(skip(self))]
    async fn report_complete(&self, id: i64) -> SourceResult<()> {
        let response = self
            .client
            .post(self.url("complete"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&CompleteRequest { request_id: id })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(job_id = id, "completion reported");
            return Ok(());
        }

        if report_already_terminal(status) {
            warn!(job_id = id, status = %status, "job already terminal on the service");
            return Ok(());
        }

        Err(status_error(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{JobOrigin, JobStatus};

    fn source(base_url: &str) -> HttpJobSource {
        HttpJobSource::new(&SourceConfig::new(base_url, "test-key"))
    }

    #[test]
    fn test_url_building() {
        let s = source("http://localhost:8000/admin/api/label-printing/");
        assert_eq!(
            s.url("pending"),
            "http://localhost:8000/admin/api/label-printing/pending"
        );
        assert_eq!(
            s.url("/request/7"),
            "http://localhost:8000/admin/api/label-printing/request/7"
        );
    }

    #[test]
    fn test_detail_envelope_deserializes() {
        let json = r#"{
            "request": {
                "id": 3,
                "status": "pending",
                "source": "manual",
                "total_labels": 4,
                "labels_printed": 0,
                "note": null
            },
            "items": [
                {
                    "sku": "KD-001",
                    "title": "Kandora",
                    "variant_label": "White / M",
                    "price_minor_units": 15900,
                    "currency": "ZAR",
                    "code39_payload": "KD001",
                    "qty_to_print": 4
                }
            ]
        }"#;

        let detail: JobDetail = serde_json::from_str(json).unwrap();
        let job = detail.into_job();

        assert_eq!(job.id, 3);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.source, JobOrigin::Manual);
        assert_eq!(job.items.len(), 1);
        assert_eq!(job.items[0].qty_to_print, 4);
        assert_eq!(job.total_labels(), 4);
    }

    #[test]
    fn test_refetch_is_structurally_identical() {
        let json = r#"{
            "request": {"id": 3, "status": "pending", "source": "manual"},
            "items": [
                {"sku": "A-1", "qty_to_print": 3},
                {"sku": "A-2", "qty_to_print": 0}
            ]
        }"#;

        let first: JobDetail = serde_json::from_str(json).unwrap();
        let second: JobDetail = serde_json::from_str(json).unwrap();
        assert_eq!(first.into_job(), second.into_job());
    }

    #[test]
    fn test_detail_without_items_is_empty_job() {
        let json = r#"{"request": {"id": 9}}"#;
        let detail: JobDetail = serde_json::from_str(json).unwrap();
        let job = detail.into_job();
        assert!(job.items.is_empty());
        assert_eq!(job.total_labels(), 0);
    }

    #[test]
    fn test_status_taxonomy() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED),
            SourceError::Auth
        ));
        assert!(matches!(status_error(StatusCode::FORBIDDEN), SourceError::Auth));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            SourceError::Unreachable(_)
        ));
    }

    #[test]
    fn test_repeated_report_is_not_fatal() {
        // a second report for the same id answers 404 or 409
        assert!(report_already_terminal(StatusCode::NOT_FOUND));
        assert!(report_already_terminal(StatusCode::CONFLICT));
        assert!(!report_already_terminal(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!report_already_terminal(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_unreachable() {
        // discard port; nothing listens there
        let s = source("http://127.0.0.1:9");
        let err = s.list_pending().await.unwrap_err();
        assert!(matches!(err, SourceError::Unreachable(_)));
    }
}
