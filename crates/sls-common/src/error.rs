//! Error types for the SLS reader

use thiserror::Error;

use crate::types::TimeWindow;

/// Result type alias for reader operations
pub type Result<T> = std::result::Result<T, SlsError>;

/// Main error type for the SLS reader
///
/// Only [`SlsError::Config`] and [`SlsError::SchemaDiscovery`] are expected to
/// stop a job during setup. Query failures are absorbed per window unless the
/// job runs with the fail-fast policy.
#[derive(Error, Debug)]
pub enum SlsError {
    /// Missing, blank, or inconsistent job configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The one-row probe produced nothing to derive columns from
    #[error("Schema discovery failed: {0}")]
    SchemaDiscovery(String),

    /// A page request failed while fetching a window
    #[error("Query failed for window {window} at offset {offset}: {message}")]
    QueryExecution {
        window: TimeWindow,
        offset: u64,
        message: String,
    },

    /// Pagination would move past the configured offset cap
    #[error("Pagination offset {offset} exceeds safety cap {cap}")]
    SafetyCapExceeded { offset: u64, cap: u64 },

    /// Transport or response failure reported by a query backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// A sink refused a row
    #[error("Sink error: {0}")]
    Sink(String),

    /// A worker task failed to run to completion
    #[error("Worker {index} failed: {message}")]
    Worker { index: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SlsError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a schema discovery error
    pub fn schema_discovery(msg: impl Into<String>) -> Self {
        Self::SchemaDiscovery(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl std::fmt::Display) -> Self {
        Self::Backend(msg.to_string())
    }

    /// Create a sink error
    pub fn sink(msg: impl std::fmt::Display) -> Self {
        Self::Sink(msg.to_string())
    }

    /// Whether this error must abort the job during setup
    pub fn is_fatal_at_setup(&self) -> bool {
        matches!(self, SlsError::Config(_) | SlsError::SchemaDiscovery(_))
    }
}
