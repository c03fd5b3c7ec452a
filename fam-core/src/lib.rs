//! FAM Core Library
//!
//! Pure Rust implementation of the file-arrival monitoring engine.
//! This crate provides the core business logic without any I/O bindings.
//!
//! # Architecture
//!
//! - `types`: Core data types (ExpectedFileSpec, TrackingRecord, Event, etc.)
//! - `resolve`: Date-token substitution in expected-file name patterns
//! - `reconcile`: Snapshot reconciliation (location membership, occurrence counts)
//! - `tracker`: The per-(spec, day) arrival state machine

pub mod types;
pub mod resolve;
pub mod reconcile;
pub mod tracker;

// Re-export commonly used types at crate root
pub use types::{
    Event,
    EventKind,
    ExpectedFileSpec,
    FamError,
    FileState,
    TrackingRecord,
};

pub use resolve::resolve_pattern;
pub use reconcile::{reconcile, Location, Reconciliation, Snapshot};
pub use tracker::{Tracker, WindowPolicy};
