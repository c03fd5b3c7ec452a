//! Expected-file specifications.
//!
//! One `ExpectedFileSpec` describes a file that should arrive once (or
//! `expected_occurrences` times) per day: a name pattern with optional date
//! tokens, the scheduled time of day, and routing metadata for the emitted
//! events. Specs are loaded once at startup and immutable during a run.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::FamError;

/// Default client name when the catalog leaves it blank.
pub const DEFAULT_CLIENT: &str = "Unknown";

/// Default category when the catalog leaves it blank.
pub const DEFAULT_CATEGORY: &str = "General";

/// Specification of a file expected to arrive on a daily schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedFileSpec {
    /// Name pattern, possibly containing date tokens (see [`crate::resolve`]).
    pub name_pattern: String,

    /// Scheduled time of day (local) the file should appear.
    pub expected_time: NaiveTime,

    /// Client the file belongs to.
    pub client: String,

    /// Category label for the emitted events.
    pub category: String,

    /// Minimum number of matching files across all locations for the day
    /// to be considered non-missing. At least 1.
    pub expected_occurrences: u32,

    /// Weekdays on which a Missing event must never be emitted for this
    /// pattern. Matched per spec, never by substring against other specs.
    #[serde(default)]
    pub exclusion_weekdays: Vec<Weekday>,
}

impl ExpectedFileSpec {
    /// Create a spec with default metadata and a single expected occurrence.
    pub fn new(name_pattern: impl Into<String>, expected_time: NaiveTime) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            expected_time,
            client: DEFAULT_CLIENT.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            expected_occurrences: 1,
            exclusion_weekdays: Vec::new(),
        }
    }

    /// Stable key identifying this spec in the tracker's record store.
    pub fn spec_id(&self) -> &str {
        &self.name_pattern
    }

    /// Check structural validity: non-empty pattern, at least one occurrence.
    pub fn validate(&self) -> Result<(), FamError> {
        if self.name_pattern.trim().is_empty() {
            return Err(FamError::invalid_spec(
                &self.name_pattern,
                "name pattern is empty",
            ));
        }
        if self.expected_occurrences == 0 {
            return Err(FamError::invalid_spec(
                &self.name_pattern,
                "expected_occurrences must be at least 1",
            ));
        }
        Ok(())
    }

    /// Whether Missing emission is suppressed on the given weekday.
    pub fn missing_excluded_on(&self, weekday: Weekday) -> bool {
        self.exclusion_weekdays.contains(&weekday)
    }

    /// Parse an "HH:MM" clock string as used by the catalog.
    pub fn parse_expected_time(value: &str) -> Result<NaiveTime, FamError> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map_err(|e| FamError::invalid_time(value, e.to_string()))
    }
}
