//! # print-agent
//!
//! Client-side print fulfillment engine.
//!
//! Polls the inventory service for queued label jobs, compiles each line
//! item into a TSPL program, streams the programs to the attached label
//! printer one physical label at a time, and reports completion back to
//! the service once every label has been transmitted.
//!
//! The engine keeps no durable queue of its own; the remote service is the
//! source of truth and the agent is restartable at any point.

pub mod config;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod progress;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use orchestrator::PrintOrchestrator;
pub use progress::{PrintPhase, PrintProgress};
