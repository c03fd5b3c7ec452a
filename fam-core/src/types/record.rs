//! Per-day tracking records.
//!
//! One `TrackingRecord` exists per (spec, calendar date) pair, created
//! lazily on first observation of that date and evicted once it falls out
//! of the tracker's retention window. Everything the state machine needs
//! to dedup emission is keyed here, so memory stays bounded by the
//! retention window rather than growing with uptime.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::EventKind;

/// Lifecycle state of an expected file for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Not yet observed in any input location.
    Pending,
    /// At least one matching file arrived in input.
    Received,
    /// A received file has been sitting unclaimed in input.
    InProgress,
    /// A received file reached an archive location.
    Completed,
    /// A received file landed in an error location.
    Error,
    /// An errored file reappeared in input and is being retried.
    Reparsing,
}

/// Tracking state for one (spec, calendar date) pair.
#[derive(Debug, Clone)]
pub struct TrackingRecord {
    /// Date-substituted literal filename stem for the record's date,
    /// resolved once at creation and reused by every pass for that date.
    pub resolved_name: String,

    /// Current lifecycle state.
    pub state: FileState,

    /// Last computed count of matching files across input+archive+error.
    /// Recomputed from the full snapshot every cycle, never decremented.
    pub occurrence_count: u32,

    /// Event kinds already emitted for this record. Every kind except
    /// `InProgress` is emitted at most once per record.
    emitted: HashSet<EventKind>,

    /// Filenames received in input and still awaiting archive/error.
    pub received: HashSet<String>,

    /// Filenames that went through the error location. Blocks re-triggering
    /// Received for the rest of the day.
    pub errored: HashSet<String>,

    /// Filenames already reparsed once today. A second error is terminal.
    pub reparsed: HashSet<String>,

    /// Filenames that reached the archive. No longer tracked as outstanding.
    pub completed: HashSet<String>,

    /// Per-filename stamp of when the in-progress timer was last armed.
    /// Cleared when the file leaves the input location, so the timer
    /// measures continuous presence.
    pub input_seen: HashMap<String, NaiveDateTime>,
}

impl TrackingRecord {
    /// Create a fresh record in the Pending state.
    pub fn new(resolved_name: impl Into<String>) -> Self {
        Self {
            resolved_name: resolved_name.into(),
            state: FileState::Pending,
            occurrence_count: 0,
            emitted: HashSet::new(),
            received: HashSet::new(),
            errored: HashSet::new(),
            reparsed: HashSet::new(),
            completed: HashSet::new(),
            input_seen: HashMap::new(),
        }
    }

    /// Whether the given kind was already emitted for this record.
    pub fn has_emitted(&self, kind: EventKind) -> bool {
        self.emitted.contains(&kind)
    }

    /// Record that a kind was emitted. Returns false if it already was,
    /// so callers can gate emission on the return value.
    pub fn mark_emitted(&mut self, kind: EventKind) -> bool {
        self.emitted.insert(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let rec = TrackingRecord::new("CRMD3375.11122024");
        assert_eq!(rec.state, FileState::Pending);
        assert_eq!(rec.occurrence_count, 0);
        assert!(rec.received.is_empty());
        assert!(!rec.has_emitted(EventKind::Received));
    }

    #[test]
    fn test_mark_emitted_is_idempotent() {
        let mut rec = TrackingRecord::new("CRMD3375.11122024");
        assert!(rec.mark_emitted(EventKind::Missing));
        assert!(!rec.mark_emitted(EventKind::Missing));
        assert!(rec.has_emitted(EventKind::Missing));
    }
}
