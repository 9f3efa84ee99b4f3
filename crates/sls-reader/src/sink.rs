//! Row sinks
//!
//! Each worker hands its rows to its own [`RowSink`]. The CLI uses
//! [`ChannelSink`]s feeding a single [`JsonLinesWriter`].

use sls_common::{Result, Row, SlsError};
use std::io::{BufWriter, Write};
use tokio::sync::mpsc::UnboundedSender;

/// Destination for projected rows
pub trait RowSink: Send {
    fn send(&mut self, row: Row) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects rows in memory
#[derive(Debug, Default)]
pub struct VecSink {
    rows: Vec<Row>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl RowSink for VecSink {
    fn send(&mut self, row: Row) -> Result<()> {
        self.rows.push(row);
        Ok(())
    }
}

/// Forwards rows to a receiver on another task
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<Row>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Row>) -> Self {
        Self { tx }
    }
}

impl RowSink for ChannelSink {
    fn send(&mut self, row: Row) -> Result<()> {
        self.tx
            .send(row)
            .map_err(|_| SlsError::sink("row receiver has been dropped"))
    }
}

/// Writes each row as one JSON array per line
pub struct JsonLinesWriter<W: Write> {
    writer: BufWriter<W>,
    written: u64,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the inner writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| SlsError::Io(e.into_error()))
    }
}

impl<W: Write + Send> RowSink for JsonLinesWriter<W> {
    fn send(&mut self, row: Row) -> Result<()> {
        self.write_row(&row)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
