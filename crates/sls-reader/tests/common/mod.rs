//! Shared test fixtures: an in-memory log store behind the backend contract
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use serde_json::json;
use sls_common::{LogEntry, Result, SlsError};
use sls_reader::{BackendConnector, Credentials, LogQuery, LogQueryBackend, QueryPage, ReaderConfig};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Timestamped entries served with `limit offset,count` pagination
#[derive(Default)]
pub struct FakeLogStore {
    entries: Vec<(i64, LogEntry)>,
    failing_windows: HashSet<i64>,
    requests: Mutex<Vec<LogQuery>>,
    connects: AtomicUsize,
    releases: AtomicUsize,
}

impl FakeLogStore {
    pub fn new(mut entries: Vec<(i64, LogEntry)>) -> Self {
        entries.sort_by_key(|(ts, _)| *ts);
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Entries every `step` seconds over `[from, to)` with `time`, `status`,
    /// `path`, and `ua` keys; every fifth entry has no `status`.
    pub fn access_log(from: i64, to: i64, step: i64) -> Self {
        let entries = (from..to)
            .step_by(step as usize)
            .enumerate()
            .map(|(i, ts)| {
                let mut pairs = vec![
                    ("time".to_string(), ts.to_string()),
                    ("path".to_string(), format!("/item/{}", i)),
                    ("ua".to_string(), "curl/8.0".to_string()),
                ];
                if i % 5 != 4 {
                    pairs.push(("status".to_string(), "200".to_string()));
                }
                (ts, LogEntry::from_pairs(pairs))
            })
            .collect();
        Self::new(entries)
    }

    /// Make every page request for the window starting at `from` fail
    pub fn fail_window(mut self, from: i64) -> Self {
        self.failing_windows.insert(from);
        self
    }

    pub fn requests(&self) -> Vec<LogQuery> {
        self.requests.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Split `"<filter> limit <offset>,<count>"`
pub fn parse_limit(query: &str) -> (u64, u64) {
    let (_, limit) = query.rsplit_once(" limit ").expect("query without limit clause");
    let (offset, count) = limit.split_once(',').expect("malformed limit clause");
    (offset.parse().unwrap(), count.parse().unwrap())
}

pub struct FakeBackend(Arc<FakeLogStore>);

#[async_trait]
impl LogQueryBackend for FakeBackend {
    async fn get_logs(&self, query: &LogQuery) -> Result<QueryPage> {
        let store = &self.0;
        store.requests.lock().unwrap().push(query.clone());

        let (offset, count) = parse_limit(&query.query);
        let is_probe = offset == 0 && count == 1;
        if !is_probe && store.failing_windows.contains(&query.from) {
            return Err(SlsError::backend("502 bad gateway"));
        }

        let logs: Vec<LogEntry> = store
            .entries
            .iter()
            .filter(|(ts, _)| query.from <= *ts && *ts < query.to)
            .skip(offset as usize)
            .take(count as usize)
            .map(|(_, e)| e.clone())
            .collect();
        Ok(QueryPage::new(logs))
    }

    fn release(&self) {
        self.0.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeConnector(pub Arc<FakeLogStore>);

impl BackendConnector for FakeConnector {
    type Backend = FakeBackend;

    fn connect(&self, _credentials: &Credentials) -> Result<FakeBackend> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(FakeBackend(Arc::clone(&self.0)))
    }
}

/// A valid job over `[from, to)` reading `time` and `status`
pub fn job(from: i64, to: i64, concurrent: i64) -> serde_json::Value {
    json!({
        "host": "log.example.com",
        "accessId": "id",
        "accessKey": "key",
        "projectName": "web",
        "logstoreName": "access",
        "query": "*",
        "fromTime": from,
        "toTime": to,
        "column": ["time", "status"],
        "concurrent": concurrent,
        "duration": 3600
    })
}

pub fn config(value: serde_json::Value) -> ReaderConfig {
    ReaderConfig::from_json_str(&value.to_string()).unwrap()
}
