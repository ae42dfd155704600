//! Print Orchestrator
//!
//! Composes the job source, the label compiler, and the printer transport
//! into one request/print/report cycle. A job moves through
//! `Fetched -> Calibrating (once per session) -> Printing -> Reporting ->
//! Done`, aborting back to pending on transport failure.
//!
//! The transport is a single exclusive resource: print triggers are guarded
//! by a busy lock and a second trigger is rejected, never interleaved. The
//! poll loop runs as an independent task and only touches the queue.

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use shared::JobSummary;
use tern_client::{JobSource, SourceError};
use tern_printer::{LabelGeometry, Printer, compile_calibration, compile_label, compile_test_label};
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::progress::{PrintPhase, PrintProgress};

/// Ephemeral per-device printer state
///
/// `calibrated` starts false at process start and resets whenever the
/// device changes; no label is transmitted before one successful
/// calibration send for the current device.
struct PrinterSession<P> {
    printer: P,
    device_ref: PathBuf,
    calibrated: bool,
}

/// Print orchestrator
///
/// Generic over the job source and printer transport so tests can drive
/// the full cycle with scripted fakes.
pub struct PrintOrchestrator<S, P> {
    source: S,
    geometry: LabelGeometry,
    session: Mutex<Option<PrinterSession<P>>>,
    queue: RwLock<Vec<JobSummary>>,
    /// Jobs fully printed whose completion report has not been delivered yet
    unreported: Mutex<Vec<i64>>,
    /// Held for the duration of any action that writes to the transport
    print_guard: Mutex<()>,
    /// Job currently holding the transport; survives queue reconciliation
    in_flight: StdMutex<Option<i64>>,
    progress_tx: watch::Sender<PrintProgress>,
}

impl<S: JobSource, P: Printer> PrintOrchestrator<S, P> {
    pub fn new(source: S, geometry: LabelGeometry) -> Self {
        let (progress_tx, _) = watch::channel(PrintProgress::idle());
        Self {
            source,
            geometry,
            session: Mutex::new(None),
            queue: RwLock::new(Vec::new()),
            unreported: Mutex::new(Vec::new()),
            print_guard: Mutex::new(()),
            in_flight: StdMutex::new(None),
            progress_tx,
        }
    }

    /// Subscribe to the progress stream
    pub fn subscribe(&self) -> watch::Receiver<PrintProgress> {
        self.progress_tx.subscribe()
    }

    /// Attach a printer for this session
    ///
    /// Re-selecting the same device keeps its calibration; a different
    /// device starts uncalibrated.
    pub async fn set_printer(&self, printer: P, device_ref: impl Into<PathBuf>) {
        let device_ref = device_ref.into();
        let mut session = self.session.lock().await;
        let calibrated = session
            .as_ref()
            .is_some_and(|s| s.device_ref == device_ref && s.calibrated);

        info!(device = %device_ref.display(), calibrated, "printer selected");
        *session = Some(PrinterSession {
            printer,
            device_ref,
            calibrated,
        });
    }

    /// Currently selected device, if any
    pub async fn device(&self) -> Option<PathBuf> {
        self.session.lock().await.as_ref().map(|s| s.device_ref.clone())
    }

    /// Whether the current session has been calibrated
    pub async fn is_calibrated(&self) -> bool {
        self.session.lock().await.as_ref().is_some_and(|s| s.calibrated)
    }

    /// Snapshot of the local job queue
    pub async fn pending_jobs(&self) -> Vec<JobSummary> {
        self.queue.read().await.clone()
    }

    /// Jobs printed in full whose completion report is still owed
    pub async fn unreported_jobs(&self) -> Vec<i64> {
        self.unreported.lock().await.clone()
    }

    /// Send a calibration program to re-sync the gap sensor
    pub async fn calibrate(&self) -> AgentResult<()> {
        let Ok(_guard) = self.print_guard.try_lock() else {
            return Err(AgentError::Busy);
        };

        let mut session = self.session.lock().await;
        let session = session.as_mut().ok_or(AgentError::NoPrinter)?;

        session
            .printer
            .print(&compile_calibration(&self.geometry))
            .await?;
        session.calibrated = true;

        info!(device = %session.device_ref.display(), "printer calibrated");
        Ok(())
    }

    /// Print the fixed alignment test label, calibrating first if needed
    pub async fn print_test_label(&self) -> AgentResult<()> {
        let Ok(_guard) = self.print_guard.try_lock() else {
            return Err(AgentError::Busy);
        };

        let mut session = self.session.lock().await;
        let session = session.as_mut().ok_or(AgentError::NoPrinter)?;

        if !session.calibrated {
            session
                .printer
                .print(&compile_calibration(&self.geometry))
                .await?;
            session.calibrated = true;
        }

        session
            .printer
            .print(&compile_test_label(&self.geometry))
            .await?;

        info!("test label sent");
        Ok(())
    }

    /// Refresh the local queue from the service
    ///
    /// Also retries any owed completion reports first, so a job that
    /// printed during an outage is never silently lost. The merged queue
    /// mirrors the remote listing; jobs that vanished remotely disappear
    /// locally unless they are in flight right now.
    pub async fn refresh_queue(&self) -> AgentResult<Vec<JobSummary>> {
        self.retry_unreported().await;

        let listing = self.source.list_pending().await?;
        let in_flight = *self.in_flight.lock().unwrap();

        let mut queue = self.queue.write().await;
        let mut merged = listing;
        if let Some(id) = in_flight
            && !merged.iter().any(|job| job.id == id)
            && let Some(current) = queue.iter().find(|job| job.id == id)
        {
            merged.push(current.clone());
        }
        *queue = merged;

        debug!(pending = queue.len(), "queue refreshed");
        Ok(queue.clone())
    }

    /// Print every label of one job, then report it complete
    ///
    /// Rejected with `Busy` while another action holds the transport. On a
    /// transport failure the job stays pending with its partial count
    /// surfaced; the operator retries the whole job.
    pub async fn print_job(&self, id: i64) -> AgentResult<()> {
        let Ok(_guard) = self.print_guard.try_lock() else {
            warn!(job_id = id, "print rejected; transport busy");
            return Err(AgentError::Busy);
        };

        *self.in_flight.lock().unwrap() = Some(id);
        let result = self.print_job_inner(id).await;
        *self.in_flight.lock().unwrap() = None;
        result
    }

    async fn print_job_inner(&self, id: i64) -> AgentResult<()> {
        let job = match self.source.get_job(id).await {
            Ok(job) => job,
            Err(SourceError::JobNotFound(_)) => {
                // Cancelled remotely between listing and trigger
                warn!(job_id = id, "job no longer exists remotely; dropping");
                self.drop_from_queue(id).await;
                return Err(AgentError::Source(SourceError::JobNotFound(id)));
            }
            Err(e) => return Err(e.into()),
        };

        let total = job.total_labels();

        if total > 0 {
            let mut session_guard = self.session.lock().await;
            let session = session_guard.as_mut().ok_or(AgentError::NoPrinter)?;

            if !session.calibrated {
                self.set_progress(Some(id), 0, total, PrintPhase::Calibrating);
                if let Err(e) = session
                    .printer
                    .print(&compile_calibration(&self.geometry))
                    .await
                {
                    self.set_progress(Some(id), 0, total, PrintPhase::Failed);
                    return Err(e.into());
                }
                session.calibrated = true;
                debug!(device = %session.device_ref.display(), "session calibrated");
            }

            let mut printed = 0u32;
            self.set_progress(Some(id), 0, total, PrintPhase::Printing);

            for item in job.items.iter().filter(|i| i.qty_to_print > 0) {
                // Compile once, transmit qty times; each physical label is
                // its own write so a failure attributes to one label.
                let program = compile_label(item, &self.geometry);

                for _ in 0..item.qty_to_print {
                    if let Err(e) = session.printer.print(&program).await {
                        error!(
                            job_id = id,
                            sku = %item.sku,
                            printed,
                            total,
                            error = %e,
                            "print aborted; job stays pending"
                        );
                        self.set_progress(Some(id), printed, total, PrintPhase::Failed);
                        return Err(e.into());
                    }
                    printed += 1;
                    self.set_progress(Some(id), printed, total, PrintPhase::Printing);
                }
            }
        } else {
            // Nothing to emit, but completion is still owed
            debug!(job_id = id, "job has no labels to print");
        }

        self.set_progress(Some(id), total, total, PrintPhase::Reporting);
        match self.source.report_complete(id).await {
            Ok(()) => {
                info!(job_id = id, labels = total, "job completed and reported");
            }
            Err(e) => {
                // Locally complete; the report is owed, not lost
                warn!(
                    job_id = id,
                    error = %e,
                    "job printed but completion report failed; retrying on next poll"
                );
                self.unreported.lock().await.push(id);
            }
        }

        self.drop_from_queue(id).await;
        self.set_progress(Some(id), total, total, PrintPhase::Done);
        Ok(())
    }

    /// Run the fixed-interval poll loop until cancelled
    pub async fn run_poll_loop(
        self: Arc<Self>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) {
        info!(interval_secs = poll_interval.as_secs(), "poll loop started");

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Cancellation drops an in-flight refresh; shutdown never
            // waits out a network timeout.
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("poll loop received shutdown signal");
                    break;
                }
                result = async {
                    ticker.tick().await;
                    self.refresh_queue().await
                } => {
                    match result {
                        Ok(jobs) => {
                            debug!(pending = jobs.len(), "poll tick");
                        }
                        Err(AgentError::Source(SourceError::Auth)) => {
                            // Misconfiguration, not a transient fault
                            error!("service rejected the API key; check API_KEY");
                        }
                        Err(e) => {
                            warn!(error = %e, "poll failed; retrying next tick");
                        }
                    }
                }
            }
        }
    }

    async fn retry_unreported(&self) {
        let owed: Vec<i64> = self.unreported.lock().await.clone();

        for id in owed {
            match self.source.report_complete(id).await {
                Ok(()) => {
                    self.unreported.lock().await.retain(|&job| job != id);
                    info!(job_id = id, "deferred completion report delivered");
                }
                Err(e) => {
                    warn!(job_id = id, error = %e, "completion report still owed");
                }
            }
        }
    }

    async fn drop_from_queue(&self, id: i64) {
        self.queue.write().await.retain(|job| job.id != id);
    }

    fn set_progress(&self, job_id: Option<i64>, printed: u32, total: u32, phase: PrintPhase) {
        self.progress_tx.send_replace(PrintProgress {
            job_id,
            labels_printed: printed,
            labels_total: total,
            phase,
        });
    }
}
