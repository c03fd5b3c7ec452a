//! Filesystem snapshot provider.
//!
//! Builds one consistent [`Snapshot`] per poll cycle by listing every
//! configured location triple. Input directories are filtered to the
//! configured extensions and carry last-modified times; archive and error
//! directories are listed wholesale. A directory that does not exist (or
//! cannot be read) contributes nothing and is never fatal.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use glob::glob;

use fam_core::Snapshot;

use crate::config::LocationSet;

/// List every configured location triple into one snapshot.
pub fn scan_locations(locations: &[LocationSet], extensions: &[String]) -> Snapshot {
    let mut snapshot = Snapshot::empty();
    for location in locations {
        scan_input(&location.input, extensions, &mut snapshot.input);
        list_names(&location.archive, &mut snapshot.archive);
        list_names(&location.error, &mut snapshot.error);
    }
    snapshot
}

/// Collect name -> mtime for matching files in one input directory.
fn scan_input(dir: &Path, extensions: &[String], out: &mut HashMap<String, DateTime<Utc>>) {
    if !dir.is_dir() {
        log::debug!("input directory {} does not exist, treating as empty", dir.display());
        return;
    }
    for extension in extensions {
        let pattern = format!("{}/*.{}", dir.display(), extension);
        for name in glob_names(&pattern) {
            let path = dir.join(&name);
            match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => {
                    out.insert(name, DateTime::<Utc>::from(modified));
                }
                Err(e) => {
                    // File vanished between listing and stat: skip it this
                    // cycle, the next snapshot settles it.
                    log::warn!("cannot stat {}: {e}", path.display());
                }
            }
        }
    }
}

/// Collect all filenames in one archive/error directory.
fn list_names(dir: &Path, out: &mut HashSet<String>) {
    if !dir.is_dir() {
        log::debug!("directory {} does not exist, treating as empty", dir.display());
        return;
    }
    let pattern = format!("{}/*", dir.display());
    out.extend(glob_names(&pattern));
}

/// Expand a glob into base filenames, logging and skipping anything odd.
fn glob_names(pattern: &str) -> Vec<String> {
    let paths = match glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            log::warn!("invalid listing pattern {pattern}: {e}");
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) {
                    names.push(name);
                }
            }
            Err(e) => {
                log::warn!("unreadable entry under {pattern}: {e}");
            }
        }
    }
    names
}
