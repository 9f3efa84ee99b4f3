//! Reader job: setup and split
//!
//! `init` validates the configuration, probes the log store once, and builds
//! the column index. `split` partitions the time range and produces one
//! [`TaskConfig`] per worker.

use sls_common::Result;
use std::collections::BTreeMap;
use tracing::info;

use crate::assign::assign_round_robin;
use crate::client::{BackendConnector, LogQueryBackend, QueryClient};
use crate::config::ReaderConfig;
use crate::partition::split_time_range;
use crate::projector::{discover_columns, ColumnIndex};
use crate::task::TaskConfig;

pub struct ReaderJob<B: LogQueryBackend> {
    config: ReaderConfig,
    client: QueryClient<B>,
    column_index: ColumnIndex,
}

impl<B: LogQueryBackend> ReaderJob<B> {
    /// Validate, probe the schema, and resolve the declared columns
    ///
    /// Fails before any window is queried when the configuration is invalid,
    /// the probe finds no sample, or a declared column is not in the sample.
    pub async fn init<C>(config: ReaderConfig, connector: &C) -> Result<Self>
    where
        C: BackendConnector<Backend = B>,
    {
        config.validate()?;
        let schema = config.schema()?;
        let range = config.range()?;

        let client = QueryClient::new(connector.connect(&config.credentials())?, config.target());
        let candidates = discover_columns(&client, range).await?;
        let column_index = ColumnIndex::resolve(&schema, &candidates)?;

        info!(
            project = %config.project_name,
            logstore = %config.logstore_name,
            range = %range,
            columns = ?schema.names(),
            "job initialised"
        );

        Ok(Self {
            config,
            client,
            column_index,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn column_index(&self) -> &ColumnIndex {
        &self.column_index
    }

    /// One task configuration per worker, windows dealt round robin
    pub fn split(&self) -> Result<Vec<TaskConfig>> {
        let workers = self.config.worker_count()?;
        let windows = split_time_range(self.config.range()?, self.config.duration);
        let buckets = assign_round_robin(&windows, workers)?;

        info!(
            windows = windows.len(),
            workers,
            duration = self.config.duration_secs(),
            "time range split"
        );

        Ok(buckets
            .into_iter()
            .enumerate()
            .map(|(worker_index, bucket)| TaskConfig {
                worker_index,
                reader: self.config.clone(),
                column_index: self.column_index.clone(),
                time_boundary: bucket
                    .iter()
                    .map(|w| (w.from, w.to))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect())
    }

    /// Release the probe client; safe to call more than once
    pub fn destroy(&self) {
        if self.client.shutdown() {
            info!("sls job destroy");
        }
    }
}
