//! SLS Reader Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Extracts fixed-schema rows from a query-capable log store over a bounded
//! time range.
//!
//! # Pipeline
//!
//! - **partition**: split `[fromTime, toTime)` into fixed-length windows
//! - **assign**: deal windows round robin to `concurrent` workers
//! - **executor**: read each window page by page
//! - **projector**: validate declared columns against a probe sample and turn
//!   each entry into a row
//!
//! # Example
//!
//! ```no_run
//! use sls_reader::{run_job, HttpConnector, ReaderConfig, VecSink};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReaderConfig::load("job.json")?;
//!     let connector = Arc::new(HttpConnector::new(config.request_timeout()));
//!     let report = run_job(config, connector, |_| VecSink::new()).await?;
//!     println!("{} rows", report.rows);
//!     Ok(())
//! }
//! ```

pub mod assign;
pub mod client;
pub mod config;
pub mod executor;
pub mod http;
pub mod job;
pub mod partition;
pub mod projector;
pub mod runner;
pub mod sink;
pub mod task;

pub use client::{BackendConnector, Credentials, LogQuery, LogQueryBackend, QueryClient, QueryPage, QueryTarget};
pub use config::ReaderConfig;
pub use executor::{FailurePolicy, FetchOutcome, PaginatedQueryExecutor, PaginationSettings, WindowFetch};
pub use http::{HttpConnector, HttpLogBackend};
pub use job::ReaderJob;
pub use projector::{CandidateColumnSet, ColumnIndex, ColumnSchema};
pub use runner::{run_job, JobReport};
pub use sink::{ChannelSink, JsonLinesWriter, RowSink, VecSink};
pub use task::{ReaderTask, TaskConfig, TaskReport};
