//! In-memory feed source with scripted failures and offset cursors.
//!
//! Drives the paginator in unit and integration tests without a document
//! store: records are served in the order given (callers construct them
//! publish-time descending), cursors encode the continuation offset, and a
//! failure queue injects errors ahead of successful responses. Clones share
//! state, so tests can keep a handle for failure injection and call
//! counting after the paginator takes ownership.

use crate::error::{FeedError, Result};
use crate::feed::item::{AreaFilter, Cursor, RawRecord};
use crate::source::{RemoteFeedSource, SourcePage};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Clone)]
pub struct MockFeedSource {
    records: Arc<Vec<RawRecord>>,
    failures: Arc<Mutex<VecDeque<FeedError>>>,
    query_calls: Arc<AtomicU64>,
    list_calls: Arc<AtomicU64>,
    latency: Option<Duration>,
}

impl MockFeedSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: Arc::new(records),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            query_calls: Arc::new(AtomicU64::new(0)),
            list_calls: Arc::new(AtomicU64::new(0)),
            latency: None,
        }
    }

    /// Queue errors to be returned, one per call, before real responses.
    pub fn with_failures(self, failures: Vec<FeedError>) -> Self {
        if let Ok(mut queue) = self.failures.lock() {
            queue.extend(failures);
        }
        self
    }

    /// Simulated per-call latency, for exercising the timeout race.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue one more error, usable through a shared handle mid-test.
    pub fn push_failure(&self, error: FeedError) {
        if let Ok(mut queue) = self.failures.lock() {
            queue.push_back(error);
        }
    }

    pub fn query_calls(&self) -> u64 {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Builds `count` records, newest first, ids `doc-0000..`, areas
    /// rotating through markets/science/sports.
    pub fn sample_records(count: usize) -> Vec<RawRecord> {
        let areas = ["markets", "science", "sports"];
        (0..count)
            .map(|i| RawRecord {
                id: Some(format!("doc-{:04}", i)),
                headline: Some(format!("Headline {}", i)),
                summary: Some(format!("Summary {}", i)),
                image_url: Some(format!("https://img.example/{}.jpg", i)),
                source_name: Some("Newsroom".to_string()),
                external_url: Some(format!("https://news.example/{}", i)),
                area: Some(areas[i % areas.len()].to_string()),
                published_at: Some(
                    DateTime::<Utc>::UNIX_EPOCH
                        + ChronoDuration::seconds((count - i) as i64 * 60),
                ),
            })
            .collect()
    }

    fn take_failure(&self) -> Option<FeedError> {
        self.failures.lock().ok().and_then(|mut queue| queue.pop_front())
    }

    fn matching(&self, filter: &AreaFilter) -> Vec<RawRecord> {
        self.records
            .iter()
            .filter(|r| match filter {
                AreaFilter::All => true,
                AreaFilter::Area(tag) => r.area.as_deref() == Some(tag.as_str()),
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RemoteFeedSource for MockFeedSource {
    async fn query(
        &self,
        filter: &AreaFilter,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Result<SourcePage> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let matching = self.matching(filter);
        let offset = after
            .map(|c| c.as_str().parse::<usize>().unwrap_or(0))
            .unwrap_or(0);
        let records: Vec<RawRecord> =
            matching.iter().skip(offset).take(page_size).cloned().collect();
        let next = offset + records.len();
        let next_cursor = (next < matching.len()).then(|| Cursor::new(next.to_string()));

        Ok(SourcePage {
            records,
            next_cursor,
        })
    }

    async fn list_all(&self) -> Result<Vec<RawRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        Ok(self.records.as_ref().clone())
    }
}
