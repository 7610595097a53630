//! Historical spec durations.
//!
//! The database is maintained outside this crate and comes in two shapes:
//! a single JSON array of records (legacy) or one JSON record per line.
//! Both yield the same [`DurationMap`]. Bad records are skipped with a
//! warning; a database that cannot be read at all weighs every spec 0s.

use crate::error::{PartitionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// One record of the duration database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationRecord {
    pub suite: String,
    pub filename: String,
    /// Seconds.
    pub expected_duration: f64,
}

/// Spec identifier to expected duration in seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationMap {
    durations: HashMap<String, f64>,
}

impl DurationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from records of `suite`; later records win.
    pub fn from_records(suite: &str, records: impl IntoIterator<Item = DurationRecord>) -> Self {
        let mut map = Self::new();
        for record in records.into_iter().filter(|r| r.suite == suite) {
            map.insert(record.filename, record.expected_duration);
        }
        map
    }

    /// Parse either database shape.
    pub fn parse(content: &str, suite: &str, path: &Path) -> Self {
        let trimmed = content.trim_start();
        let records = if trimmed.starts_with('[') {
            parse_array(trimmed, path)
        } else {
            parse_lines(content, path)
        };
        let map = Self::from_records(suite, records);
        debug!(path = %path.display(), suite, entries = map.len(), "Loaded duration database");
        map
    }

    /// Load the database at `path`. A missing file yields an empty map.
    pub fn load(path: &Path, suite: &str) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content, suite, path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Duration database not found; every spec weighs 0s");
                Ok(Self::new())
            }
            Err(e) => Err(PartitionError::io(path, e)),
        }
    }

    /// Record a duration, clamping negative and non-finite values to zero.
    pub fn insert(&mut self, identifier: impl Into<String>, seconds: f64) {
        self.durations.insert(identifier.into(), clamp(seconds));
    }

    /// Expected duration, 0 when unknown.
    pub fn get(&self, identifier: &str) -> f64 {
        match self.durations.get(identifier) {
            Some(secs) => *secs,
            None => {
                debug!(spec = identifier, "No recorded duration, assuming 0s");
                0.0
            }
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.durations.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}

impl FromIterator<(String, f64)> for DurationMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, secs) in iter {
            map.insert(id, secs);
        }
        map
    }
}

fn clamp(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn parse_array(content: &str, path: &Path) -> Vec<DurationRecord> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(content) {
        Ok(values) => values,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable duration database; every spec weighs 0s");
            return Vec::new();
        }
    };
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), index = idx, error = %e, "Skipping malformed duration record");
                None
            }
        })
        .collect()
}

fn parse_lines(content: &str, path: &Path) -> Vec<DurationRecord> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str(line.trim()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), line = idx + 1, error = %e, "Skipping malformed duration record");
                None
            }
        })
        .collect()
}
