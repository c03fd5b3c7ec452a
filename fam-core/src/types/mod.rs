//! Core type definitions for FAM.

mod spec;
mod event;
mod record;
mod error;

pub use spec::ExpectedFileSpec;
pub use event::{Event, EventKind};
pub use record::{FileState, TrackingRecord};
pub use error::FamError;
