//! Common types used across the SLS reader

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlsError};

/// A half-open time interval `[from, to)` in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: i64,
    pub to: i64,
}

impl TimeWindow {
    /// Create a window, rejecting empty or inverted intervals
    pub fn new(from: i64, to: i64) -> Result<Self> {
        if from >= to {
            return Err(SlsError::config(format!(
                "window start ({}) must be less than window end ({})",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Length of the window in seconds
    ///
    /// Unsigned so that a window spanning most of the `i64` range still fits.
    pub fn len_secs(&self) -> u64 {
        self.to.abs_diff(self.from)
    }

    /// Window start as a UTC timestamp, if representable
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.from, 0)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

/// One key/value pair of a log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContent {
    pub key: String,
    pub value: String,
}

impl LogContent {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single retrieved log record
///
/// Contents are unordered; duplicate keys are kept as received and the last one
/// wins during projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub contents: Vec<LogContent>,
}

impl LogEntry {
    pub fn new(contents: Vec<LogContent>) -> Self {
        Self { contents }
    }

    /// Build an entry from `(key, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            contents: pairs
                .into_iter()
                .map(|(k, v)| LogContent::new(k, v))
                .collect(),
        }
    }

    /// Build an entry from a JSON object as returned by the query API
    ///
    /// String values are taken verbatim; any other JSON value is rendered to
    /// its JSON text.
    pub fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            contents: object
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    LogContent { key, value }
                })
                .collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.contents.iter().map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// A fixed-width row of nullable text cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub cells: Vec<Option<String>>,
}

impl Row {
    /// A row of `width` null cells
    pub fn empty(width: usize) -> Self {
        Self {
            cells: vec![None; width],
        }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}
