//! FAM Daemon - the polling runtime around the arrival state machine.
//!
//! This crate owns everything fam-core deliberately does not: reading the
//! monitor configuration and expected-file catalog, listing directories,
//! delivering event batches to the monitoring backend, and the supervised
//! poll loop that ties them together.

pub mod catalog;
pub mod config;
pub mod monitor;
pub mod sink;
pub mod snapshot;

pub use catalog::load_catalog;
pub use config::{LocationSet, MonitorConfig};
pub use monitor::Monitor;
pub use sink::{EventSink, InsightsSink, MemorySink, SinkError};
pub use snapshot::scan_locations;

/// Daemon error types.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Monitor configuration unreadable or malformed. Fatal at startup.
    #[error("config error: {0}")]
    Config(String),

    /// Expected-file catalog unreadable or malformed. Fatal at startup.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Core state-machine error.
    #[error("core error: {0}")]
    Core(#[from] fam_core::FamError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaemonError {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }
}
