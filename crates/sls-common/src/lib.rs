//! SLS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the SLS reader workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the reader's error taxonomy and result type
//! - **Logging**: `tracing` subscriber configuration shared by binaries
//! - **Types**: time windows, log entries, and projected rows
//!
//! # Example
//!
//! ```no_run
//! use sls_common::{Result, SlsError, TimeWindow};
//!
//! fn window(from: i64, to: i64) -> Result<TimeWindow> {
//!     TimeWindow::new(from, to)
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SlsError};
pub use types::{LogContent, LogEntry, Row, TimeWindow};
