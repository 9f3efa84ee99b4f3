//! Runs a reader job across its worker pool
//!
//! Setup happens once; each worker then runs on its own tokio task with its
//! own backend, windows, and sink. Workers are never cancelled: a failing
//! worker does not stop the others, and the first failure is reported after
//! all of them finish.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sls_common::{Result, SlsError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::client::BackendConnector;
use crate::config::ReaderConfig;
use crate::job::ReaderJob;
use crate::sink::RowSink;
use crate::task::{ReaderTask, TaskReport};

/// Totals over all workers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub tasks: Vec<TaskReport>,
    pub windows: usize,
    pub requests: usize,
    pub rows: u64,
    pub truncated_windows: usize,
    pub degraded_windows: usize,
}

impl JobReport {
    fn from_tasks(mut tasks: Vec<TaskReport>) -> Self {
        tasks.sort_by_key(|t| t.worker_index);
        Self {
            windows: tasks.iter().map(|t| t.windows).sum(),
            requests: tasks.iter().map(|t| t.requests).sum(),
            rows: tasks.iter().map(|t| t.rows).sum(),
            truncated_windows: tasks.iter().map(|t| t.truncated_windows).sum(),
            degraded_windows: tasks.iter().map(|t| t.degraded_windows).sum(),
            tasks,
        }
    }

    /// Whether every window was read to its end
    pub fn is_complete(&self) -> bool {
        self.truncated_windows == 0 && self.degraded_windows == 0
    }
}

/// Run `config` to completion
///
/// `sink_for` is called once per worker with its index.
pub async fn run_job<C, S, F>(config: ReaderConfig, connector: Arc<C>, mut sink_for: F) -> Result<JobReport>
where
    C: BackendConnector + 'static,
    S: RowSink + 'static,
    F: FnMut(usize) -> S,
{
    let start_time = Instant::now();

    let job = ReaderJob::init(config, connector.as_ref()).await?;
    let task_configs = job.split()?;

    let handles: Vec<_> = task_configs
        .into_iter()
        .map(|task_config| {
            let index = task_config.worker_index;
            let connector = Arc::clone(&connector);
            let mut sink = sink_for(index);
            let handle = tokio::spawn(async move {
                let mut task = ReaderTask::init(task_config, connector.as_ref())?;
                let result = task.start_read(&mut sink).await;
                task.destroy();
                result
            });
            (index, handle)
        })
        .collect();

    let (indices, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let joined = join_all(handles).await;
    job.destroy();

    let mut reports = Vec::with_capacity(joined.len());
    let mut first_error = None;
    for (index, result) in indices.into_iter().zip(joined) {
        match result {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                error!(worker = index, error = %e, "worker failed");
                first_error.get_or_insert(e);
            },
            Err(join_err) => {
                error!(worker = index, error = %join_err, "worker panicked");
                first_error.get_or_insert(SlsError::Worker {
                    index,
                    message: join_err.to_string(),
                });
            },
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let report = JobReport::from_tasks(reports);
    if !report.is_complete() {
        warn!(
            truncated = report.truncated_windows,
            degraded = report.degraded_windows,
            "job finished with incomplete windows"
        );
    }
    info!(
        workers = report.tasks.len(),
        windows = report.windows,
        rows = report.rows,
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "job complete"
    );

    Ok(report)
}
