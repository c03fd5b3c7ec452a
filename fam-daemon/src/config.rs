//! Monitor configuration.
//!
//! Stored as TOML. A minimal file names the sink credentials, the catalog,
//! and at least one location triple; every threshold has a default matching
//! the production deployment this replaced.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fs_err as fs;
use serde::{Deserialize, Serialize};

use fam_core::WindowPolicy;

use crate::DaemonError;

/// One input/archive/error directory triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSet {
    /// Drop directory where expected files arrive.
    pub input: PathBuf,
    /// Directory files move to after successful processing.
    pub archive: PathBuf,
    /// Directory files move to after a processing failure.
    pub error: PathBuf,
}

/// Configuration for the FAM monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// API key for the event sink. Required for `run`, not for dry passes.
    #[serde(default)]
    pub api_key: String,

    /// Backend account identifier.
    #[serde(default)]
    pub account_id: String,

    /// Path to the expected-file catalog.
    pub catalog: PathBuf,

    /// Tracked location triples. At least one.
    pub locations: Vec<LocationSet>,

    /// Extensions listed from input directories.
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Events per delivery batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seconds before the expected time the arrival window opens.
    #[serde(default = "default_window_secs")]
    pub pre_window_secs: u64,

    /// Seconds after the expected time the arrival window stays open.
    #[serde(default = "default_window_secs")]
    pub post_window_secs: u64,

    /// Seconds before the window's trailing edge the missing check arms.
    #[serde(default = "default_threshold_secs")]
    pub missing_lead_secs: u64,

    /// Seconds a file may sit in input before an InProgress event fires.
    #[serde(default = "default_threshold_secs")]
    pub in_progress_threshold_secs: u64,

    /// Days of tracking records kept before eviction.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_input_extensions() -> Vec<String> {
    vec!["txt".to_string(), "csv".to_string(), "ADFO".to_string()]
}

fn default_poll_interval_secs() -> u64 {
    20
}

fn default_batch_size() -> usize {
    1
}

fn default_window_secs() -> u64 {
    120
}

fn default_threshold_secs() -> u64 {
    15
}

fn default_retention_days() -> u32 {
    3
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DaemonError::config(format!("cannot read {}: {e}", path.display())))?;
        let config: MonitorConfig = toml::from_str(&contents)
            .map_err(|e| DaemonError::config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the structural parts of the configuration.
    ///
    /// Credential checks are separate ([`Self::validate_credentials`]) so
    /// dry passes can run against a config without sink access.
    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.locations.is_empty() {
            return Err(DaemonError::config("at least one [[locations]] triple is required"));
        }
        if self.input_extensions.is_empty() {
            return Err(DaemonError::config("input_extensions must not be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(DaemonError::config("poll_interval_secs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(DaemonError::config("batch_size must be at least 1"));
        }
        Ok(())
    }

    /// Require sink credentials to be present (fatal before `run`).
    pub fn validate_credentials(&self) -> Result<(), DaemonError> {
        if self.api_key.trim().is_empty() {
            return Err(DaemonError::config("api_key is required to deliver events"));
        }
        if self.account_id.trim().is_empty() {
            return Err(DaemonError::config("account_id is required to deliver events"));
        }
        Ok(())
    }

    /// The poll interval as a std Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// The state machine thresholds configured here.
    pub fn window_policy(&self) -> WindowPolicy {
        WindowPolicy {
            pre_window: chrono::Duration::seconds(self.pre_window_secs as i64),
            post_window: chrono::Duration::seconds(self.post_window_secs as i64),
            missing_lead: chrono::Duration::seconds(self.missing_lead_secs as i64),
            in_progress_threshold: chrono::Duration::seconds(
                self.in_progress_threshold_secs as i64,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("fam.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_config_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
catalog = "checklist.toml"

[[locations]]
input = "/data/in"
archive = "/data/archive"
error = "/data/error"
"#,
        );

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval_secs, 20);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.pre_window_secs, 120);
        assert_eq!(config.post_window_secs, 120);
        assert_eq!(config.missing_lead_secs, 15);
        assert_eq!(config.in_progress_threshold_secs, 15);
        assert_eq!(config.retention_days, 3);
        assert_eq!(config.input_extensions, vec!["txt", "csv", "ADFO"]);
        assert_eq!(config.locations.len(), 1);

        // Credentials absent: structurally valid, not deliverable.
        assert!(config.validate_credentials().is_err());
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
api_key = "NRAK-TEST"
account_id = "1234567"
catalog = "checklist.toml"
poll_interval_secs = 30
batch_size = 25
retention_days = 7

[[locations]]
input = "/data/in"
archive = "/data/archive"
error = "/data/error"

[[locations]]
input = "/data2/in"
archive = "/data2/archive"
error = "/data2/error"
"#,
        );

        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.locations.len(), 2);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.retention_days, 7);
        config.validate_credentials().unwrap();
    }

    #[test]
    fn test_missing_locations_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "catalog = \"checklist.toml\"\nlocations = []\n");
        assert!(matches!(
            MonitorConfig::load(&path),
            Err(DaemonError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "catalog = [not toml");
        assert!(matches!(
            MonitorConfig::load(&path),
            Err(DaemonError::Config(_))
        ));
    }

    #[test]
    fn test_unreadable_config_is_fatal() {
        assert!(matches!(
            MonitorConfig::load(Path::new("/nonexistent/fam.toml")),
            Err(DaemonError::Config(_))
        ));
    }
}
