//! Column schema resolution and row projection
//!
//! Setup probes one sample entry, checks the declared columns against its
//! keys, and freezes a name-to-position [`ColumnIndex`]. Workers then project
//! every retrieved entry through their own copy of that index.

use sls_common::{LogEntry, Result, Row, SlsError, TimeWindow};
use std::collections::{BTreeSet, HashMap};
use tracing::{error, info};

use crate::client::{LogQueryBackend, QueryClient};
use crate::config::duplicate_names;

/// Declared extraction columns, in output order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    /// Validate and wrap the declared column list
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(SlsError::config("column list must not be empty"));
        }
        if names.iter().any(|n| n.is_empty()) {
            return Err(SlsError::config("column list contains an empty name"));
        }
        let dups = duplicate_names(&names);
        if !dups.is_empty() {
            return Err(SlsError::config(format!(
                "column list contains duplicates: {}",
                dups.join(",")
            )));
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Keys observed in the schema probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateColumnSet {
    keys: BTreeSet<String>,
}

impl CandidateColumnSet {
    pub fn from_entry(entry: &LogEntry) -> Self {
        Self {
            keys: entry.keys().map(str::to_string).collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Probe `range` for one entry and collect its keys
///
/// A failed probe or an empty result is a schema discovery error; the job
/// cannot validate its columns without a sample.
pub async fn discover_columns<B: LogQueryBackend>(
    client: &QueryClient<B>,
    range: TimeWindow,
) -> Result<CandidateColumnSet> {
    let target = client.target();
    let sample = client.probe(range).await.map_err(|e| {
        error!(error = %e, range = %range, "schema probe failed");
        SlsError::schema_discovery(format!("probe query over {} failed: {}", range, e))
    })?;

    let candidates = sample
        .as_ref()
        .map(CandidateColumnSet::from_entry)
        .unwrap_or_default();

    if candidates.is_empty() {
        return Err(SlsError::schema_discovery(format!(
            "probe over {} returned no sample row for query '{}', please check the query parameter",
            range, target.query
        )));
    }

    info!(
        candidates = ?candidates.keys().collect::<Vec<_>>(),
        "column candidates discovered"
    );
    Ok(candidates)
}

/// Fixed position of every declared column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Index the schema in declaration order
    pub fn from_schema(schema: &ColumnSchema) -> Self {
        Self {
            positions: schema
                .names()
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect(),
        }
    }

    /// Check every declared column against the probe, then index the schema
    pub fn resolve(schema: &ColumnSchema, candidates: &CandidateColumnSet) -> Result<Self> {
        if let Some(missing) = schema.names().iter().find(|n| !candidates.contains(n)) {
            return Err(SlsError::config(format!(
                "column '{}' not in candidate set: {}",
                missing,
                candidates.keys().collect::<Vec<_>>().join(",")
            )));
        }
        Ok(Self::from_schema(schema))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Number of cells in every projected row
    pub fn width(&self) -> usize {
        self.positions.len()
    }

    /// Project an entry onto the declared columns
    ///
    /// Keys outside the schema are dropped; declared columns missing from the
    /// entry stay null.
    pub fn project(&self, entry: &LogEntry) -> Row {
        let mut row = Row::empty(self.width());
        for content in &entry.contents {
            if let Some(cell) = self.position(&content.key).and_then(|i| row.cells.get_mut(i)) {
                *cell = Some(content.value.clone());
            }
        }
        row
    }
}
