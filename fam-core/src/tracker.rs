//! The arrival state machine.
//!
//! `Tracker` owns one [`TrackingRecord`] per (spec, calendar date) pair in
//! an explicit keyed store with a bounded retention window. Each poll cycle
//! the caller hands it the spec, the cycle's snapshot, and the wall-clock
//! instant; `observe` advances the record and returns the events to emit.
//!
//! Emission rules:
//! - every event kind except `InProgress` fires at most once per record;
//! - `InProgress` re-arms per filename every threshold interval for as long
//!   as the file sits continuously in an input location;
//! - `Missing` fires only near the trailing edge of the expected window,
//!   only while the record is still Pending, and never on a weekday the
//!   spec excludes.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, Utc};

use crate::reconcile::{reconcile, Snapshot};
use crate::resolve::resolve_pattern;
use crate::types::{Event, EventKind, ExpectedFileSpec, FileState, TrackingRecord};

/// Tunable time thresholds for the state machine.
#[derive(Debug, Clone)]
pub struct WindowPolicy {
    /// How long before the expected time the window opens.
    pub pre_window: Duration,
    /// How long after the expected time the window stays open.
    pub post_window: Duration,
    /// How close to the window's trailing edge the missing check arms.
    pub missing_lead: Duration,
    /// How long a file may sit in input before an InProgress event fires.
    pub in_progress_threshold: Duration,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            pre_window: Duration::minutes(2),
            post_window: Duration::minutes(2),
            missing_lead: Duration::seconds(15),
            in_progress_threshold: Duration::seconds(15),
        }
    }
}

impl WindowPolicy {
    /// Whether `t` falls inside the expected window around `expected_at`.
    ///
    /// Arrival handling does not depend on this (early and late files are
    /// Received all the same); it classifies arrivals for operator logs.
    pub fn within_expected_window(&self, expected_at: NaiveDateTime, t: NaiveDateTime) -> bool {
        t >= expected_at - self.pre_window && t <= expected_at + self.post_window
    }
}

/// Keyed store of tracking records plus the evaluation logic.
#[derive(Debug)]
pub struct Tracker {
    /// (spec id, date) -> record. Exactly one record per pair.
    records: HashMap<(String, NaiveDate), TrackingRecord>,
    /// Records older than this many days are evicted.
    retention_days: u32,
}

impl Tracker {
    /// Create a tracker that retains records for `retention_days` days.
    pub fn new(retention_days: u32) -> Self {
        Self {
            records: HashMap::new(),
            retention_days,
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the record for a spec and date, if one exists.
    pub fn record(&self, spec_id: &str, date: NaiveDate) -> Option<&TrackingRecord> {
        self.records.get(&(spec_id.to_string(), date))
    }

    /// Drop records for dates older than the retention window.
    /// Returns the number of records evicted.
    pub fn evict_stale(&mut self, today: NaiveDate) -> usize {
        let cutoff = today - Duration::days(i64::from(self.retention_days));
        let before = self.records.len();
        self.records.retain(|(_, date), _| *date >= cutoff);
        before - self.records.len()
    }

    /// Run one evaluation pass for one spec against the cycle's snapshot.
    ///
    /// Creates the day's record on demand, advances its state, and returns
    /// the events this pass produced. Infallible: a snapshot with nothing
    /// relevant in it simply produces no events.
    pub fn observe(
        &mut self,
        spec: &ExpectedFileSpec,
        snapshot: &Snapshot,
        now: DateTime<Local>,
        policy: &WindowPolicy,
    ) -> Vec<Event> {
        let date = now.date_naive();
        let t = now.naive_local();
        let captured_at = now.with_timezone(&Utc);
        let expected_at = date.and_time(spec.expected_time);

        // The pattern is resolved once, when the day's record is created;
        // every later pass for that date reuses the stored name.
        let rec = self
            .records
            .entry((spec.spec_id().to_string(), date))
            .or_insert_with(|| TrackingRecord::new(resolve_pattern(&spec.name_pattern, date)));
        let resolved = rec.resolved_name.clone();

        // A record left in Reparsing last cycle has already re-entered
        // received tracking; it proceeds as Received from here.
        if rec.state == FileState::Reparsing {
            rec.state = FileState::Received;
        }

        rec.occurrence_count = reconcile(snapshot, &resolved).occurrence_count;

        let mut events = Vec::new();
        let matching: Vec<String> = snapshot
            .matching_input(&resolved)
            .map(str::to_string)
            .collect();

        // Arrival. Early and late files emit the identical event as on-time
        // ones; the expected window only matters for the missing check.
        for name in &matching {
            if rec.errored.contains(name) || rec.completed.contains(name) {
                continue;
            }
            let newly_tracked = rec.received.insert(name.clone());
            if newly_tracked && rec.mark_emitted(EventKind::Received) {
                if rec.state == FileState::Pending {
                    rec.state = FileState::Received;
                }
                events.push(Event::new(
                    EventKind::Received,
                    spec,
                    name,
                    expected_at,
                    captured_at,
                ));
            }
        }

        // Missing check, armed near the trailing edge of the window so the
        // file keeps getting a chance to arrive until then. The record stays
        // Pending afterwards: a late arrival is still Received.
        if rec.state == FileState::Pending && !rec.has_emitted(EventKind::Missing) {
            let window_close = expected_at + policy.post_window;
            let check_from = window_close - policy.missing_lead;
            if t >= expected_at
                && t <= window_close
                && t >= check_from
                && rec.occurrence_count < spec.expected_occurrences
                && !spec.missing_excluded_on(now.weekday())
            {
                rec.mark_emitted(EventKind::Missing);
                events.push(Event::new(
                    EventKind::Missing,
                    spec,
                    resolved.clone(),
                    expected_at,
                    captured_at,
                ));
            }
        }

        // In-progress timer, per filename, any time of day. Re-arms every
        // threshold interval for as long as the file stays put.
        for name in &matching {
            if rec.completed.contains(name) {
                continue;
            }
            match rec.input_seen.get_mut(name) {
                None => {
                    rec.input_seen.insert(name.clone(), t);
                }
                Some(armed_at) => {
                    if t - *armed_at >= policy.in_progress_threshold {
                        *armed_at = t;
                        if rec.state == FileState::Received {
                            rec.state = FileState::InProgress;
                        }
                        events.push(Event::new(
                            EventKind::InProgress,
                            spec,
                            name,
                            expected_at,
                            captured_at,
                        ));
                    }
                }
            }
        }
        // A file that left input restarts its timer if it comes back.
        rec.input_seen.retain(|name, _| matching.iter().any(|m| m == name));

        // Completion: a received file reached the archive.
        let archived: Vec<String> = rec
            .received
            .iter()
            .filter(|name| snapshot.archive.contains(*name))
            .cloned()
            .collect();
        for name in archived {
            rec.received.remove(&name);
            rec.input_seen.remove(&name);
            rec.completed.insert(name.clone());
            if rec.mark_emitted(EventKind::Completed) {
                rec.state = FileState::Completed;
                events.push(Event::new(
                    EventKind::Completed,
                    spec,
                    name,
                    expected_at,
                    captured_at,
                ));
            }
        }

        // Failure: a received file landed in the error location instead.
        let failed: Vec<String> = rec
            .received
            .iter()
            .filter(|name| snapshot.error.contains(*name))
            .cloned()
            .collect();
        for name in failed {
            rec.received.remove(&name);
            rec.input_seen.remove(&name);
            rec.errored.insert(name.clone());
            if rec.mark_emitted(EventKind::Error) {
                rec.state = FileState::Error;
                events.push(Event::new(
                    EventKind::Error,
                    spec,
                    name,
                    expected_at,
                    captured_at,
                ));
            }
        }

        // Reparse: an errored file back in input is retried once per day.
        // Emits the informational Reparsing and the state-changing
        // ReparsingFile together, then the filename re-enters received
        // tracking so it can reach Completed (or a terminal second error).
        let retries: Vec<String> = rec
            .errored
            .iter()
            .filter(|name| snapshot.input.contains_key(*name) && !rec.reparsed.contains(*name))
            .cloned()
            .collect();
        for name in retries {
            rec.reparsed.insert(name.clone());
            rec.received.insert(name.clone());
            if rec.mark_emitted(EventKind::Reparsing) {
                events.push(Event::new(
                    EventKind::Reparsing,
                    spec,
                    name.clone(),
                    expected_at,
                    captured_at,
                ));
            }
            if rec.mark_emitted(EventKind::ReparsingFile) {
                rec.state = FileState::Reparsing;
                events.push(Event::new(
                    EventKind::ReparsingFile,
                    spec,
                    name,
                    expected_at,
                    captured_at,
                ));
            }
        }

        events
    }
}
