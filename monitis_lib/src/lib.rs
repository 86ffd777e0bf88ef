//! Monitis API client library.
//!
//! Provides a typed client for the external-monitor actions of the Monitis API:
//! requesting an auth token and editing an existing monitor.

pub mod client;
pub mod error;
pub mod monitor;

pub use client::{Auth, Client};
pub use error::{ApiError, Error};
pub use monitor::{EditExternalMonitorOptions, EditExternalMonitorOutput, MonitorParam};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
