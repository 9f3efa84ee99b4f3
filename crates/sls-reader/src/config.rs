//! Job configuration
//!
//! A reader job is described by a JSON document using the camelCase keys of
//! the original reader plugin (`host`, `accessId`, `fromTime`, `column`, ...).
//! Credentials may be supplied through `SLS_ACCESS_ID` / `SLS_ACCESS_KEY`,
//! optionally from a `.env` file.

use serde::{Deserialize, Serialize};
use sls_common::{Result, SlsError, TimeWindow};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::client::{Credentials, QueryTarget};
use crate::executor::{FailurePolicy, PaginationSettings};
use crate::projector::ColumnSchema;

// ============================================================================
// Reader Configuration Constants
// ============================================================================

/// Default window length in seconds.
pub const DEFAULT_DURATION_SECS: i64 = 3600;

/// Default number of entries requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

/// Default cap on the pagination offset within one window.
pub const DEFAULT_MAX_OFFSET: u64 = 1_000_000;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Reader job configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    pub host: String,
    pub access_id: String,
    pub access_key: String,
    pub project_name: String,
    pub logstore_name: String,
    pub topic: String,
    pub query: Option<String>,
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
    pub column: Vec<String>,
    pub duration: Option<i64>,
    pub concurrent: Option<i64>,
    pub page_size: Option<i64>,
    pub max_offset: Option<i64>,
    pub failure_policy: FailurePolicy,
    pub request_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("host", &self.host)
            .field("access_id", &self.access_id)
            .field("access_key", &"***")
            .field("project_name", &self.project_name)
            .field("logstore_name", &self.logstore_name)
            .field("topic", &self.topic)
            .field("query", &self.query)
            .field("from_time", &self.from_time)
            .field("to_time", &self.to_time)
            .field("column", &self.column)
            .field("duration", &self.duration)
            .field("concurrent", &self.concurrent)
            .field("page_size", &self.page_size)
            .field("max_offset", &self.max_offset)
            .field("failure_policy", &self.failure_policy)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ReaderConfig {
    /// Load, apply environment overrides, and validate a job file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a job file without validating it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SlsError::config(format!("cannot read job file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse a job document without validating it
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| SlsError::config(format!("invalid job document: {}", e)))
    }

    /// Replace credentials with `SLS_ACCESS_ID` / `SLS_ACCESS_KEY` when set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("SLS_ACCESS_ID") {
            self.access_id = id;
        }
        if let Ok(key) = std::env::var("SLS_ACCESS_KEY") {
            self.access_key = key;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("host", &self.host),
            ("accessId", &self.access_id),
            ("accessKey", &self.access_key),
            ("projectName", &self.project_name),
            ("logstoreName", &self.logstore_name),
        ] {
            if value.trim().is_empty() {
                return Err(SlsError::config(format!("{} must not be blank", name)));
            }
        }

        if self.query.is_none() {
            return Err(SlsError::config("query is required"));
        }

        self.range()?;
        self.schema()?;
        self.worker_count()?;
        self.pagination()?;

        if self.request_timeout_secs == Some(0) {
            return Err(SlsError::config("requestTimeoutSecs must be greater than 0"));
        }

        Ok(())
    }

    /// The global extraction range `[fromTime, toTime)`
    pub fn range(&self) -> Result<TimeWindow> {
        let from = self
            .from_time
            .ok_or_else(|| SlsError::config("fromTime is required"))?;
        let to = self
            .to_time
            .ok_or_else(|| SlsError::config("toTime is required"))?;
        if from >= to {
            return Err(SlsError::config(format!(
                "fromTime ({}) must be less than toTime ({})",
                from, to
            )));
        }
        TimeWindow::new(from, to)
    }

    /// The declared columns, in order
    pub fn schema(&self) -> Result<ColumnSchema> {
        ColumnSchema::new(self.column.clone())
    }

    /// Number of workers, from `concurrent`
    pub fn worker_count(&self) -> Result<usize> {
        match self.concurrent {
            None => Err(SlsError::config("concurrent is required")),
            Some(n) if n <= 0 => Err(SlsError::config(format!(
                "concurrent must be greater than 0, got {}",
                n
            ))),
            Some(n) => usize::try_from(n)
                .map_err(|_| SlsError::config(format!("concurrent is too large: {}", n))),
        }
    }

    /// Window length, defaulting when absent or non-positive
    pub fn duration_secs(&self) -> i64 {
        crate::partition::effective_duration(self.duration)
    }

    pub fn pagination(&self) -> Result<PaginationSettings> {
        let page_size = match self.page_size {
            None => DEFAULT_PAGE_SIZE,
            Some(n) if n > 0 => n as u64,
            Some(n) => {
                return Err(SlsError::config(format!(
                    "pageSize must be greater than 0, got {}",
                    n
                )))
            },
        };
        let max_offset = match self.max_offset {
            None => DEFAULT_MAX_OFFSET,
            Some(n) if n >= 0 => n as u64,
            Some(n) => {
                return Err(SlsError::config(format!(
                    "maxOffset must not be negative, got {}",
                    n
                )))
            },
        };

        Ok(PaginationSettings {
            page_size,
            max_offset,
            failure_policy: self.failure_policy,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            access_id: self.access_id.clone(),
            access_key: self.access_key.clone(),
        }
    }

    /// Project, logstore, topic, and filter the job queries
    pub fn target(&self) -> QueryTarget {
        QueryTarget {
            project: self.project_name.clone(),
            logstore: self.logstore_name.clone(),
            topic: self.topic.clone(),
            query: self.query.clone().unwrap_or_default(),
        }
    }
}

/// Names that occur more than once, in first-duplicate order
pub(crate) fn duplicate_names(names: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for name in names {
        if !seen.insert(name.as_str()) && !dups.contains(&name.as_str()) {
            dups.push(name.as_str());
        }
    }
    dups
}
