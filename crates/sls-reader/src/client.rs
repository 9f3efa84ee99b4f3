//! Log query backend contract and the per-owner query client
//!
//! A [`LogQueryBackend`] is the transport: it answers one paged query at a
//! time. A [`QueryClient`] binds a backend to the project, logstore, topic, and
//! filter of a job and owns its release.

use async_trait::async_trait;
use sls_common::{LogEntry, Result, SlsError, TimeWindow};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Connection credentials for a log store endpoint
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub access_id: String,
    pub access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("access_id", &self.access_id)
            .field("access_key", &"***")
            .finish()
    }
}

/// What a job queries: project, logstore, topic, and base filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub project: String,
    pub logstore: String,
    pub topic: String,
    pub query: String,
}

/// One paged request as seen by a backend
///
/// `query` already carries the pagination suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub project: String,
    pub logstore: String,
    pub from: i64,
    pub to: i64,
    pub topic: String,
    pub query: String,
}

/// One page of results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    /// Entry count reported by the backend
    pub count: u64,
    pub logs: Vec<LogEntry>,
}

impl QueryPage {
    pub fn new(logs: Vec<LogEntry>) -> Self {
        Self {
            count: logs.len() as u64,
            logs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.logs.is_empty()
    }
}

/// Transport able to answer paged log queries
#[async_trait]
pub trait LogQueryBackend: Send + Sync {
    /// Run one paged query
    async fn get_logs(&self, query: &LogQuery) -> Result<QueryPage>;

    /// Release the underlying transport
    ///
    /// Called at most once per backend by [`QueryClient::shutdown`].
    fn release(&self);
}

/// Builds a backend from credentials
///
/// Each worker connects its own backend; nothing is shared between them.
pub trait BackendConnector: Send + Sync {
    type Backend: LogQueryBackend + 'static;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Backend>;
}

/// Pagination suffix appended to the job filter
pub fn limit_clause(offset: u64, limit: u64) -> String {
    format!(" limit {},{}", offset, limit)
}

/// A backend bound to one query target, released exactly once
pub struct QueryClient<B: LogQueryBackend> {
    backend: B,
    target: QueryTarget,
    released: AtomicBool,
}

impl<B: LogQueryBackend> QueryClient<B> {
    pub fn new(backend: B, target: QueryTarget) -> Self {
        Self {
            backend,
            target,
            released: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &QueryTarget {
        &self.target
    }

    /// Fetch `limit` entries of `window` starting at `offset`
    pub async fn fetch_page(&self, window: TimeWindow, offset: u64, limit: u64) -> Result<QueryPage> {
        self.run(window, &limit_clause(offset, limit)).await
    }

    /// Fetch a single sample entry from `range`, if any
    pub async fn probe(&self, range: TimeWindow) -> Result<Option<LogEntry>> {
        let page = self.run(range, &limit_clause(0, 1)).await?;
        Ok(page.logs.into_iter().next())
    }

    async fn run(&self, window: TimeWindow, suffix: &str) -> Result<QueryPage> {
        if self.is_shut_down() {
            return Err(SlsError::backend("query client has been shut down"));
        }

        let request = LogQuery {
            project: self.target.project.clone(),
            logstore: self.target.logstore.clone(),
            from: window.from,
            to: window.to,
            topic: self.target.topic.clone(),
            query: format!("{}{}", self.target.query, suffix),
        };
        self.backend.get_logs(&request).await
    }

    /// Release the backend
    ///
    /// Returns `true` only for the call that actually released it; later calls
    /// are no-ops.
    pub fn shutdown(&self) -> bool {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.backend.release();
            debug!(
                project = %self.target.project,
                logstore = %self.target.logstore,
                "query client released"
            );
            true
        } else {
            false
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl<B: LogQueryBackend> Drop for QueryClient<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
