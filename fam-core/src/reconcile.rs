//! Snapshot reconciliation.
//!
//! A `Snapshot` is one consistent listing of every tracked location, taken
//! at the start of a poll cycle. Reconciliation answers two questions per
//! resolved name: which locations hold a matching file, and how many
//! matching files exist across all of them.
//!
//! Matching is substring containment of the resolved name, not equality:
//! real drop files carry suffixes and extensions appended to the expected
//! stem (`CRMD3375.` matches `CRMD3375.11122024.txt`).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

/// One of the three tracked location roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Drop directory where files arrive.
    Input,
    /// Directory files move to after successful processing.
    Archive,
    /// Directory files move to after a processing failure.
    Error,
}

/// A point-in-time listing of all tracked locations.
///
/// Input entries carry the file's last-modified time; archive and error
/// listings are plain name sets. Directories that did not exist at scan
/// time simply contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Filename -> last-modified time, across all input directories.
    pub input: HashMap<String, DateTime<Utc>>,
    /// Filenames across all archive directories.
    pub archive: HashSet<String>,
    /// Filenames across all error directories.
    pub error: HashSet<String>,
}

impl Snapshot {
    /// An empty snapshot (all directories empty or absent).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Filenames in the input listing that match the resolved name.
    pub fn matching_input<'a>(&'a self, resolved_name: &'a str) -> impl Iterator<Item = &'a str> {
        self.input
            .keys()
            .filter(move |name| name.contains(resolved_name))
            .map(String::as_str)
    }
}

/// Location membership and occurrence count for one resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Locations holding at least one matching filename.
    pub present_in: HashSet<Location>,
    /// Matching filenames across the union of all three listings.
    pub occurrence_count: u32,
}

impl Reconciliation {
    /// Whether any matching file is present in the given location.
    pub fn is_present_in(&self, location: Location) -> bool {
        self.present_in.contains(&location)
    }
}

/// Compute location membership and the occurrence count for one resolved
/// name against a snapshot. Empty snapshots are valid input.
pub fn reconcile(snapshot: &Snapshot, resolved_name: &str) -> Reconciliation {
    let mut present_in = HashSet::new();
    let mut all_names: HashSet<&str> = HashSet::new();

    for name in snapshot.input.keys() {
        if name.contains(resolved_name) {
            present_in.insert(Location::Input);
        }
        all_names.insert(name);
    }
    for name in &snapshot.archive {
        if name.contains(resolved_name) {
            present_in.insert(Location::Archive);
        }
        all_names.insert(name);
    }
    for name in &snapshot.error {
        if name.contains(resolved_name) {
            present_in.insert(Location::Error);
        }
        all_names.insert(name);
    }

    // Counted over the union so a file listed in two locations at once
    // (mid-move copies) is not double counted.
    let occurrence_count = all_names
        .iter()
        .filter(|name| name.contains(resolved_name))
        .count() as u32;

    Reconciliation {
        present_in,
        occurrence_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(input: &[&str], archive: &[&str], error: &[&str]) -> Snapshot {
        Snapshot {
            input: input
                .iter()
                .map(|n| (n.to_string(), Utc::now()))
                .collect(),
            archive: archive.iter().map(|n| n.to_string()).collect(),
            error: error.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let rec = reconcile(&Snapshot::empty(), "CRMD3375.");
        assert!(rec.present_in.is_empty());
        assert_eq!(rec.occurrence_count, 0);
    }

    #[test]
    fn test_substring_matching_counts_suffixed_names() {
        let snap = snapshot(
            &["CRMD3375.11122024.txt"],
            &["CRMD3375.11112024.txt"],
            &[],
        );
        let rec = reconcile(&snap, "CRMD3375.");
        assert_eq!(rec.occurrence_count, 2);
        assert!(rec.is_present_in(Location::Input));
        assert!(rec.is_present_in(Location::Archive));
        assert!(!rec.is_present_in(Location::Error));
    }

    #[test]
    fn test_exact_stem_does_not_match_other_patterns() {
        let snap = snapshot(&["CCBD3076.11122024.txt"], &[], &[]);
        let rec = reconcile(&snap, "CRMD3375.");
        assert_eq!(rec.occurrence_count, 0);
        assert!(rec.present_in.is_empty());
    }

    #[test]
    fn test_same_name_across_locations_counted_once() {
        let snap = snapshot(
            &["FILE_20241112.csv"],
            &["FILE_20241112.csv"],
            &[],
        );
        let rec = reconcile(&snap, "FILE_20241112.csv");
        assert_eq!(rec.occurrence_count, 1);
        assert!(rec.is_present_in(Location::Input));
        assert!(rec.is_present_in(Location::Archive));
    }

    #[test]
    fn test_matching_input_iterator() {
        let snap = snapshot(
            &["CRMD3375.11122024.txt", "OTHER.txt"],
            &[],
            &[],
        );
        let matches: Vec<&str> = snap.matching_input("CRMD3375.").collect();
        assert_eq!(matches, vec!["CRMD3375.11122024.txt"]);
    }
}
