//! Paginated retrieval of one time window
//!
//! The backend only returns bounded pages, so a window is read by requesting
//! `page_size` entries at increasing offsets until a page comes back empty.
//! Offsets past `max_offset` are never requested; the window is truncated
//! instead.

use serde::{Deserialize, Serialize};
use sls_common::{LogEntry, Result, SlsError, TimeWindow};
use tracing::{debug, error, warn};

use crate::client::{LogQueryBackend, QueryClient};
use crate::config::{DEFAULT_MAX_OFFSET, DEFAULT_PAGE_SIZE};

/// What to do when a page request fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Keep what was already fetched for the window and move on
    #[default]
    BestEffort,
    /// Fail the worker, and with it the job
    FailFast,
}

/// Page size, offset cap, and failure policy for window fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub page_size: u64,
    pub max_offset: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_offset: DEFAULT_MAX_OFFSET,
            failure_policy: FailurePolicy::BestEffort,
        }
    }
}

/// How a window fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// An empty page was reached
    Complete,
    /// The offset cap stopped pagination
    Truncated,
    /// A page request failed; entries hold what came before it
    Degraded,
}

/// Entries retrieved for one window
#[derive(Debug, Clone)]
pub struct WindowFetch {
    pub window: TimeWindow,
    pub entries: Vec<LogEntry>,
    /// Page requests issued, including the final empty or failed one
    pub requests: usize,
    pub outcome: FetchOutcome,
}

/// Reads whole windows page by page
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginatedQueryExecutor {
    settings: PaginationSettings,
}

impl PaginatedQueryExecutor {
    pub fn new(settings: PaginationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PaginationSettings {
        &self.settings
    }

    /// Fetch every entry of `window`, in response order
    ///
    /// Under [`FailurePolicy::BestEffort`] this never returns an error; a
    /// failed page ends the window with [`FetchOutcome::Degraded`].
    pub async fn fetch_window<B: LogQueryBackend>(
        &self,
        client: &QueryClient<B>,
        window: TimeWindow,
    ) -> Result<WindowFetch> {
        let PaginationSettings {
            page_size,
            max_offset,
            failure_policy,
        } = self.settings;

        let mut entries = Vec::new();
        let mut requests = 0;
        let mut offset: u64 = 0;

        let outcome = loop {
            if offset > max_offset {
                let cap = SlsError::SafetyCapExceeded {
                    offset,
                    cap: max_offset,
                };
                error!(window = %window, error = %cap, fetched = entries.len(), "truncating window");
                break FetchOutcome::Truncated;
            }

            requests += 1;
            let page = match client.fetch_page(window, offset, page_size).await {
                Ok(page) => page,
                Err(e) => {
                    let err = SlsError::QueryExecution {
                        window,
                        offset,
                        message: e.to_string(),
                    };
                    if failure_policy == FailurePolicy::FailFast {
                        return Err(err);
                    }
                    error!(error = %err, fetched = entries.len(), "page request failed, keeping partial window");
                    break FetchOutcome::Degraded;
                },
            };

            debug!(window = %window, offset, count = page.count, "sub query");
            if page.is_empty() {
                break FetchOutcome::Complete;
            }
            if page.logs.len() as u64 > page_size {
                warn!(
                    window = %window,
                    offset,
                    returned = page.logs.len(),
                    page_size,
                    "backend returned more entries than requested"
                );
            }

            entries.extend(page.logs);
            offset = offset.saturating_add(page_size);
        };

        Ok(WindowFetch {
            window,
            entries,
            requests,
            outcome,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::client::{LogQuery, QueryPage, QueryTarget};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves scripted page sizes in order, then empty pages; `fail_at` makes
    /// the request with that index fail.
    struct ScriptedBackend {
        pages: Vec<usize>,
        fail_at: Option<usize>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(pages: Vec<usize>) -> Self {
            Self {
                pages,
                fail_at: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing_at(mut self, request: usize) -> Self {
            self.fail_at = Some(request);
            self
        }
    }

    #[async_trait]
    impl LogQueryBackend for ScriptedBackend {
        async fn get_logs(&self, query: &LogQuery) -> Result<QueryPage> {
            let mut seen = self.seen.lock().unwrap();
            let index = seen.len();
            seen.push(query.query.clone());

            if self.fail_at == Some(index) {
                return Err(SlsError::backend("503 service unavailable"));
            }
            let size = self.pages.get(index).copied().unwrap_or(0);
            let logs = (0..size)
                .map(|i| LogEntry::from_pairs([("seq", format!("{}-{}", index, i))]))
                .collect();
            Ok(QueryPage::new(logs))
        }

        fn release(&self) {}
    }

    fn client(backend: ScriptedBackend) -> QueryClient<ScriptedBackend> {
        QueryClient::new(
            backend,
            QueryTarget {
                project: "p".into(),
                logstore: "l".into(),
                topic: String::new(),
                query: "*".into(),
            },
        )
    }

    fn window() -> TimeWindow {
        TimeWindow::new(0, 3600).unwrap()
    }

    #[tokio::test]
    async fn test_stops_after_empty_page() {
        let client = client(ScriptedBackend::new(vec![10_000, 10_000, 3_000]));
        let executor = PaginatedQueryExecutor::default();

        let fetch = executor.fetch_window(&client, window()).await.unwrap();

        assert_eq!(fetch.entries.len(), 23_000);
        assert_eq!(fetch.requests, 4);
        assert_eq!(fetch.outcome, FetchOutcome::Complete);
    }

    #[tokio::test]
    async fn test_offsets_advance_by_page_size() {
        let client = client(ScriptedBackend::new(vec![5, 5]));
        let executor = PaginatedQueryExecutor::new(PaginationSettings {
            page_size: 5,
            ..PaginationSettings::default()
        });

        let fetch = executor.fetch_window(&client, window()).await.unwrap();
        assert_eq!(fetch.entries.len(), 10);
        assert_eq!(fetch.entries[0].contents[0].value, "0-0");
        assert_eq!(fetch.entries[9].contents[0].value, "1-4");
    }

    #[tokio::test]
    async fn test_safety_cap_truncates() {
        let client = client(ScriptedBackend::new(vec![10; 100]));
        let executor = PaginatedQueryExecutor::new(PaginationSettings {
            page_size: 10,
            max_offset: 25,
            failure_policy: FailurePolicy::BestEffort,
        });

        let fetch = executor.fetch_window(&client, window()).await.unwrap();

        // offsets 0, 10, 20 are requested; 30 is past the cap
        assert_eq!(fetch.requests, 3);
        assert_eq!(fetch.entries.len(), 30);
        assert_eq!(fetch.outcome, FetchOutcome::Truncated);
    }

    #[tokio::test]
    async fn test_cap_equal_to_offset_is_still_requested() {
        let client = client(ScriptedBackend::new(vec![10; 100]));
        let executor = PaginatedQueryExecutor::new(PaginationSettings {
            page_size: 10,
            max_offset: 20,
            failure_policy: FailurePolicy::BestEffort,
        });

        let fetch = executor.fetch_window(&client, window()).await.unwrap();
        assert_eq!(fetch.requests, 3);
        assert_eq!(fetch.outcome, FetchOutcome::Truncated);
    }

    #[tokio::test]
    async fn test_best_effort_keeps_partial_window() {
        let client = client(ScriptedBackend::new(vec![10, 10, 10]).failing_at(2));
        let executor = PaginatedQueryExecutor::new(PaginationSettings {
            page_size: 10,
            ..PaginationSettings::default()
        });

        let fetch = executor.fetch_window(&client, window()).await.unwrap();
        assert_eq!(fetch.entries.len(), 20);
        assert_eq!(fetch.requests, 3);
        assert_eq!(fetch.outcome, FetchOutcome::Degraded);
    }

    #[tokio::test]
    async fn test_best_effort_first_page_failure_is_empty() {
        let client = client(ScriptedBackend::new(vec![10]).failing_at(0));
        let fetch = PaginatedQueryExecutor::default()
            .fetch_window(&client, window())
            .await
            .unwrap();
        assert!(fetch.entries.is_empty());
        assert_eq!(fetch.outcome, FetchOutcome::Degraded);
    }

    #[tokio::test]
    async fn test_fail_fast_propagates() {
        let client = client(ScriptedBackend::new(vec![10, 10]).failing_at(1));
        let executor = PaginatedQueryExecutor::new(PaginationSettings {
            page_size: 10,
            max_offset: DEFAULT_MAX_OFFSET,
            failure_policy: FailurePolicy::FailFast,
        });

        match executor.fetch_window(&client, window()).await {
            Err(SlsError::QueryExecution { window: w, offset, message }) => {
                assert_eq!(w, window());
                assert_eq!(offset, 10);
                assert!(message.contains("503"));
            },
            other => panic!("unexpected {:?}", other.map(|f| f.outcome)),
        }
    }
}
