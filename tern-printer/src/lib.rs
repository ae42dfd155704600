//! # tern-printer
//!
//! TSPL label printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - TSPL command building
//! - Label compilation (item -> printer program bytes)
//! - Gap-sensor calibration programs
//! - USB character device transport (`/dev/usb/lp*`)
//!
//! Business logic (WHAT to print, when to report completion) stays in the
//! print agent.
//!
//! ## Example
//!
//! ```ignore
//! use tern_printer::{compile_label, LabelGeometry, Printer, UsbPrinter};
//!
//! let geometry = LabelGeometry::default();
//! let program = compile_label(&item, &geometry);
//!
//! let printer = UsbPrinter::new("/dev/usb/lp0");
//! printer.print(&program).await?;
//! ```

mod error;
mod transport;
mod tspl;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use transport::{DEFAULT_DEVICE_DIR, Printer, UsbPrinter, discover_devices};
pub use tspl::{
    LabelGeometry, TsplBuilder, compile_calibration, compile_label, compile_test_label,
    normalize_code39,
};
