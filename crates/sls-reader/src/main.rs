//! SLS Reader - extract log store entries as JSON-lines rows

use anyhow::{Context, Result};
use clap::Parser;
use sls_common::logging::{init_logging, LogConfig, LogLevel};
use sls_reader::{run_job, ChannelSink, HttpConnector, JsonLinesWriter, ReaderConfig, RowSink};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sls-reader")]
#[command(author, version, about = "Extract rows from a log store over a time range")]
struct Cli {
    /// Job configuration file (JSON)
    #[arg(short, long, env = "SLS_READER_CONFIG")]
    config: PathBuf,

    /// Write rows to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("sls-reader")
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    let config = ReaderConfig::load(&cli.config)
        .with_context(|| format!("Failed to load job {}", cli.config.display()))?;
    info!(config = ?config, "configuration loaded");

    let out: Box<dyn Write + Send> = match &cli.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let writer = tokio::task::spawn_blocking(move || -> sls_common::Result<u64> {
        let mut writer = JsonLinesWriter::new(out);
        while let Some(row) = rx.blocking_recv() {
            writer.send(row)?;
        }
        writer.flush()?;
        Ok(writer.written())
    });

    let connector = Arc::new(HttpConnector::new(config.request_timeout()));
    let result = run_job(config, connector, |_| ChannelSink::new(tx.clone())).await;
    drop(tx);

    let written = writer.await.context("Row writer panicked")??;
    let report = result?;

    info!(
        rows = written,
        windows = report.windows,
        complete = report.is_complete(),
        "extraction complete"
    );
    Ok(())
}
