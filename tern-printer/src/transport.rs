//! Printer transport for USB character devices
//!
//! Thermal label printers show up as `/dev/usb/lp*` character devices on
//! Linux. The transport is a dumb byte pipe: it writes a complete TSPL
//! program per call and assumes no protocol state on the printer side.
//! Retry policy belongs to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::error::{PrintError, PrintResult};

/// Directory scanned for attached label printers
pub const DEFAULT_DEVICE_DIR: &str = "/dev/usb";

/// Pause after each label so the device clears its input buffer
const INTER_LABEL_DELAY_MS: u64 = 200;

/// Trait for printer transports
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send one complete label program to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check whether the device is currently attached
    async fn is_attached(&self) -> bool;
}

/// Enumerate candidate printer devices (`lp*` entries), sorted
///
/// An empty result is not an error; it means no printer is attached or the
/// device directory does not exist.
pub fn discover_devices(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir.as_ref()) else {
        return Vec::new();
    };

    let mut devices: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("lp"))
        })
        .collect();

    devices.sort();
    devices
}

/// USB character device printer
///
/// Opens the device for exclusive write per program, writes the full byte
/// sequence, and releases the handle on every exit path. Each physical
/// label is its own `print` call; the device enforces one-label-per-write
/// boundaries.
#[derive(Debug, Clone)]
pub struct UsbPrinter {
    path: PathBuf,
    pace: Duration,
}

impl UsbPrinter {
    /// Create a printer for a device path (e.g. `/dev/usb/lp0`)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pace: Duration::from_millis(INTER_LABEL_DELAY_MS),
        }
    }

    /// Override the inter-label pause
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Get the device path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Printer for UsbPrinter {
    #[instrument(skip(self, data), fields(device = %self.path.display(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut device = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                warn!(error = %e, "open device failed");
                PrintError::DeviceUnavailable(format!("{}: {}", self.path.display(), e))
            })?;

        device.write_all(data).await.map_err(|e| {
            PrintError::TransportWrite(format!("{}: {}", self.path.display(), e))
        })?;

        device.flush().await.map_err(|e| {
            PrintError::TransportWrite(format!("{}: {}", self.path.display(), e))
        })?;

        debug!("label program sent");

        // Release the device before the pacing sleep
        drop(device);

        if !self.pace.is_zero() {
            tokio::time::sleep(self.pace).await;
        }

        Ok(())
    }

    async fn is_attached(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => !meta.is_dir(),
            Err(_) => false,
        }
    }
}
