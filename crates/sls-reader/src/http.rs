//! HTTP log query backend
//!
//! Talks to a JSON query gateway in front of the log store:
//!
//! ```text
//! GET {host}/projects/{project}/logstores/{logstore}/logs?from=&to=&topic=&query=
//! Authorization: Basic base64(accessId:accessKey)
//!
//! {"count": 2, "logs": [{"status": "200", "path": "/"}, {"status": "404"}]}
//! ```

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use sls_common::{LogEntry, Result, SlsError};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use crate::client::{BackendConnector, Credentials, LogQuery, LogQueryBackend, QueryPage};
use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;

#[derive(Debug, Deserialize)]
struct GetLogsResponse {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    logs: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// reqwest-backed [`LogQueryBackend`]
pub struct HttpLogBackend {
    client: RwLock<Option<Client>>,
    base_url: Url,
    access_id: String,
    access_key: String,
}

impl HttpLogBackend {
    pub fn new(credentials: &Credentials, timeout: Duration) -> Result<Self> {
        let base_url = parse_host(&credentials.host)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SlsError::backend)?;

        Ok(Self {
            client: RwLock::new(Some(client)),
            base_url,
            access_id: credentials.access_id.clone(),
            access_key: credentials.access_key.clone(),
        })
    }

    fn logs_url(&self, project: &str, logstore: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SlsError::config(format!("host '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["projects", project, "logstores", logstore, "logs"]);
        Ok(url)
    }

    fn http_client(&self) -> Result<Client> {
        let guard = self
            .client
            .read()
            .map_err(|_| SlsError::backend("http client lock poisoned"))?;
        guard
            .clone()
            .ok_or_else(|| SlsError::backend("http client has been released"))
    }
}

/// Accept bare hosts (`cn-hangzhou.log.example.com`) as well as full URLs
fn parse_host(host: &str) -> Result<Url> {
    let host = host.trim();
    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    Url::parse(&raw).map_err(|e| SlsError::config(format!("invalid host '{}': {}", host, e)))
}

#[async_trait]
impl LogQueryBackend for HttpLogBackend {
    async fn get_logs(&self, query: &LogQuery) -> Result<QueryPage> {
        let url = self.logs_url(&query.project, &query.logstore)?;
        let client = self.http_client()?;

        let response = client
            .get(url.clone())
            .basic_auth(&self.access_id, Some(&self.access_key))
            .query(&[
                ("from", query.from.to_string()),
                ("to", query.to.to_string()),
                ("topic", query.topic.clone()),
                ("query", query.query.clone()),
            ])
            .send()
            .await
            .map_err(SlsError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlsError::backend(format!(
                "GET {} returned {}: {}",
                url.path(),
                status,
                body.trim()
            )));
        }

        let body: GetLogsResponse = response.json().await.map_err(SlsError::backend)?;
        let logs: Vec<LogEntry> = body.logs.into_iter().map(LogEntry::from_json_object).collect();
        let count = body.count.unwrap_or(logs.len() as u64);

        debug!(from = query.from, to = query.to, count, "get logs");
        Ok(QueryPage { count, logs })
    }

    fn release(&self) {
        if let Ok(mut guard) = self.client.write() {
            guard.take();
        }
    }
}

/// Connects [`HttpLogBackend`]s with a fixed request timeout
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

impl BackendConnector for HttpConnector {
    type Backend = HttpLogBackend;

    fn connect(&self, credentials: &Credentials) -> Result<HttpLogBackend> {
        HttpLogBackend::new(credentials, self.timeout)
    }
}
