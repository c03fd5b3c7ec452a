//! Expected-file catalog loading.
//!
//! The catalog is a TOML file of `[[expected]]` tables, one per expected
//! file. A malformed or unreadable catalog is a fatal startup error; the
//! monitor never starts polling against a partial checklist.
//!
//! ```toml
//! [[expected]]
//! file_name = "CRMD3375."
//! expected_time = "06:00"
//! client = "Acme"
//! category = "Settlement"
//! expected_occurrences = 1
//! exclude_missing_on = ["Sunday"]
//! ```

use std::path::Path;
use std::str::FromStr;

use chrono::Weekday;
use fs_err as fs;
use serde::Deserialize;

use fam_core::{ExpectedFileSpec, FamError};

use crate::DaemonError;

/// Raw catalog file shape.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    expected: Vec<CatalogEntry>,
}

/// One `[[expected]]` table as written in the catalog.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    file_name: String,
    expected_time: String,
    #[serde(default)]
    client: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    expected_occurrences: Option<u32>,
    #[serde(default)]
    exclude_missing_on: Vec<String>,
}

impl CatalogEntry {
    fn into_spec(self) -> Result<ExpectedFileSpec, FamError> {
        let expected_time = ExpectedFileSpec::parse_expected_time(&self.expected_time)?;
        let mut spec = ExpectedFileSpec::new(self.file_name.trim(), expected_time);

        if let Some(client) = self.client.filter(|c| !c.trim().is_empty()) {
            spec.client = client;
        }
        if let Some(category) = self.category.filter(|c| !c.trim().is_empty()) {
            spec.category = category;
        }
        if let Some(occurrences) = self.expected_occurrences {
            spec.expected_occurrences = occurrences;
        }
        for name in &self.exclude_missing_on {
            let weekday = Weekday::from_str(name.trim())
                .map_err(|_| FamError::invalid_weekday(name.trim()))?;
            spec.exclusion_weekdays.push(weekday);
        }

        spec.validate()?;
        Ok(spec)
    }
}

/// Load the ordered expected-file specs from a catalog file.
pub fn load_catalog(path: &Path) -> Result<Vec<ExpectedFileSpec>, DaemonError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| DaemonError::catalog(format!("cannot read {}: {e}", path.display())))?;
    let file: CatalogFile = toml::from_str(&contents)
        .map_err(|e| DaemonError::catalog(format!("cannot parse {}: {e}", path.display())))?;

    if file.expected.is_empty() {
        return Err(DaemonError::catalog(format!(
            "{} contains no [[expected]] entries",
            path.display()
        )));
    }

    file.expected
        .into_iter()
        .map(|entry| entry.into_spec().map_err(DaemonError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::path::PathBuf;

    fn write_catalog(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("checklist.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(
            dir.path(),
            r#"
[[expected]]
file_name = "CRMD3375."
expected_time = "06:00"
client = "Acme"
category = "Settlement"
exclude_missing_on = ["Sunday"]

[[expected]]
file_name = "FILE_<dateToken1>.csv"
expected_time = "09:30"
expected_occurrences = 2
"#,
        );

        let specs = load_catalog(&path).unwrap();
        assert_eq!(specs.len(), 2);

        assert_eq!(specs[0].name_pattern, "CRMD3375.");
        assert_eq!(
            specs[0].expected_time,
            NaiveTime::from_hms_opt(6, 0, 0).unwrap()
        );
        assert_eq!(specs[0].client, "Acme");
        assert_eq!(specs[0].exclusion_weekdays, vec![Weekday::Sun]);

        // Defaults fill in what the entry leaves out.
        assert_eq!(specs[1].client, "Unknown");
        assert_eq!(specs[1].category, "General");
        assert_eq!(specs[1].expected_occurrences, 2);
        assert!(specs[1].exclusion_weekdays.is_empty());
    }

    #[test]
    fn test_bad_expected_time_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(
            dir.path(),
            "[[expected]]\nfile_name = \"A.\"\nexpected_time = \"25:99\"\n",
        );
        assert!(load_catalog(&path).is_err());
    }

    #[test]
    fn test_bad_weekday_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(
            dir.path(),
            "[[expected]]\nfile_name = \"A.\"\nexpected_time = \"06:00\"\nexclude_missing_on = [\"Someday\"]\n",
        );
        assert!(load_catalog(&path).is_err());
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "\n");
        assert!(matches!(
            load_catalog(&path),
            Err(DaemonError::Catalog(_))
        ));
    }

    #[test]
    fn test_unreadable_catalog_is_fatal() {
        assert!(matches!(
            load_catalog(Path::new("/nonexistent/checklist.toml")),
            Err(DaemonError::Catalog(_))
        ));
    }
}
