//! Lifecycle events.
//!
//! Events are immutable facts: once created they are never mutated, only
//! batched and delivered. The field names and the `eventType`/`status`
//! strings are the wire contract with the monitoring backend and must not
//! change.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ExpectedFileSpec;

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Expected file appeared in an input location.
    Received,
    /// Expected file did not arrive by the end of its window.
    Missing,
    /// File has been sitting unclaimed in an input location.
    #[serde(rename = "Inprogress")]
    InProgress,
    /// Received file moved to an archive location.
    Completed,
    /// Received file moved to an error location.
    Error,
    /// Errored file reappeared in input (informational).
    Reparsing,
    /// Errored file re-entered received tracking (state-changing).
    #[serde(rename = "Reparsingfile")]
    ReparsingFile,
}

impl EventKind {
    /// The `eventType` string sent to the backend.
    pub fn wire_name(&self) -> &'static str {
        match self {
            EventKind::Received => "Received",
            EventKind::Missing => "Missing",
            EventKind::InProgress => "Inprogress",
            EventKind::Completed => "Completed",
            EventKind::Error => "Error",
            EventKind::Reparsing => "Reparsing",
            EventKind::ReparsingFile => "Reparsingfile",
        }
    }

    /// The human-readable `status` string sent to the backend.
    pub fn status_label(&self) -> &'static str {
        match self {
            EventKind::Received => "Received",
            EventKind::Missing => "Missing",
            EventKind::InProgress => "In Progress",
            EventKind::Completed => "Completely Parsed",
            EventKind::Error => "Error while Parsing",
            EventKind::Reparsing => "Reparsed File",
            EventKind::ReparsingFile => "Reparsed",
        }
    }
}

/// A single lifecycle event, ready for serialization to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Kind of event, serialized as the `eventType` wire string.
    pub event_type: EventKind,

    /// Client the expected file belongs to.
    pub client_name: String,

    /// Human-readable status label for this kind.
    pub status: String,

    /// The matched filename (or the resolved pattern, for Missing).
    pub file_name: String,

    /// Category label from the spec.
    pub category: String,

    /// Scheduled arrival datetime for that day, "%Y-%m-%d %H:%M:%S".
    pub expected_time: String,

    /// Capture time in UTC, RFC 3339.
    pub timestamp: String,
}

impl Event {
    /// Build an event for a spec's record.
    ///
    /// `expected_at` is the spec's scheduled datetime for the record's day;
    /// `captured_at` is the observation wall-clock instant in UTC.
    pub fn new(
        kind: EventKind,
        spec: &ExpectedFileSpec,
        file_name: impl Into<String>,
        expected_at: NaiveDateTime,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: kind,
            client_name: spec.client.clone(),
            status: kind.status_label().to_string(),
            file_name: file_name.into(),
            category: spec.category.clone(),
            expected_time: expected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamp: captured_at.to_rfc3339(),
        }
    }
}
