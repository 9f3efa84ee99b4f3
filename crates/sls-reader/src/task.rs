//! Reader task: one worker's share of the job
//!
//! A task owns a private backend client, created at `init` and released at
//! `destroy`, and reads its windows sequentially.

use serde::{Deserialize, Serialize};
use sls_common::{Result, TimeWindow};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::client::{BackendConnector, LogQueryBackend, QueryClient};
use crate::config::ReaderConfig;
use crate::executor::{FetchOutcome, PaginatedQueryExecutor};
use crate::projector::ColumnIndex;
use crate::sink::RowSink;

/// Per-worker configuration produced by `ReaderJob::split`
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub worker_index: usize,
    pub reader: ReaderConfig,
    pub column_index: ColumnIndex,
    /// Window start to window end, for this worker only
    pub time_boundary: BTreeMap<i64, i64>,
}

impl TaskConfig {
    /// This worker's windows, ordered by start
    pub fn windows(&self) -> impl Iterator<Item = TimeWindow> + '_ {
        self.time_boundary
            .iter()
            .map(|(&from, &to)| TimeWindow { from, to })
    }
}

/// Counters for one worker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    pub worker_index: usize,
    pub windows: usize,
    pub requests: usize,
    pub rows: u64,
    pub truncated_windows: usize,
    pub degraded_windows: usize,
}

pub struct ReaderTask<B: LogQueryBackend> {
    no: usize,
    config: TaskConfig,
    executor: PaginatedQueryExecutor,
    client: Option<QueryClient<B>>,
}

impl<B: LogQueryBackend> ReaderTask<B> {
    /// Connect this worker's backend
    pub fn init<C>(config: TaskConfig, connector: &C) -> Result<Self>
    where
        C: BackendConnector<Backend = B>,
    {
        let executor = PaginatedQueryExecutor::new(config.reader.pagination()?);
        let backend = connector.connect(&config.reader.credentials())?;
        let client = QueryClient::new(backend, config.reader.target());

        info!(
            worker = config.worker_index,
            windows = config.time_boundary.len(),
            columns = config.column_index.width(),
            "task initialised"
        );

        Ok(Self {
            no: config.worker_index,
            config,
            executor,
            client: Some(client),
        })
    }

    pub fn worker_index(&self) -> usize {
        self.no
    }

    /// Read every assigned window and send one row per entry to `sink`
    pub async fn start_read<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> Result<TaskReport> {
        let mut report = TaskReport {
            worker_index: self.no,
            ..TaskReport::default()
        };
        let Some(client) = self.client.as_ref() else {
            warn!(worker = self.no, "task already destroyed, nothing to read");
            return Ok(report);
        };

        for window in self.config.windows() {
            let fetch = self.executor.fetch_window(client, window).await?;
            let started_at = window.start_time().map(|t| t.to_rfc3339()).unwrap_or_default();
            info!(
                worker = self.no,
                from = window.from,
                to = window.to,
                start = %started_at,
                count = fetch.entries.len(),
                "window fetched"
            );

            report.windows += 1;
            report.requests += fetch.requests;
            match fetch.outcome {
                FetchOutcome::Complete => {},
                FetchOutcome::Truncated => report.truncated_windows += 1,
                FetchOutcome::Degraded => report.degraded_windows += 1,
            }

            for entry in &fetch.entries {
                sink.send(self.config.column_index.project(entry))?;
                report.rows += 1;
            }
        }

        sink.flush()?;
        Ok(report)
    }

    /// Release the backend; safe to call more than once
    pub fn destroy(&mut self) {
        if let Some(client) = self.client.take() {
            client.shutdown();
            info!(worker = self.no, "task destroyed");
        }
    }
}

impl<B: LogQueryBackend> Drop for ReaderTask<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}
