//! Feed paginator: the one entry point the rendering layer talks to.
//!
//! Composes the page cache, the resilient fetcher, and normalization.
//! Every public operation terminates in a usable result; remote failures
//! degrade to the last good cached value or the explicit empty page, never
//! to an error. Availability over freshness, deliberately.

use crate::config::Config;
use crate::feed::cache::{CacheConfig, CacheKey, CacheMetrics, PageCache};
use crate::feed::fetcher::ResilientFetcher;
use crate::feed::item::{normalize_page, AreaFilter, Cursor, FeedItem, Page};
use crate::source::RemoteFeedSource;
use itertools::Itertools;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct FeedPaginator<S: RemoteFeedSource> {
    source: S,
    pages: PageCache,
    areas: Mutex<Option<(Vec<String>, Instant)>>,
    area_ttl: Duration,
    fetcher: ResilientFetcher,
    startup_fetcher: ResilientFetcher,
    offline: bool,
}

impl<S: RemoteFeedSource> FeedPaginator<S> {
    pub fn new(source: S, config: &Config) -> Self {
        let fetcher = ResilientFetcher::new(
            config.fetch_timeout(),
            config.max_retries,
            config.retry_base_delay(),
        );
        let startup_fetcher = fetcher.clone().with_timeout(config.startup_fetch_timeout());
        info!(
            "feed paginator ready (page_ttl={}s, area_ttl={}s, cache_cap={}, offline={})",
            config.page_ttl_secs, config.area_ttl_secs, config.cache_max_entries, config.offline
        );

        Self {
            source,
            pages: PageCache::new(CacheConfig {
                ttl: config.page_ttl(),
                max_entries: config.cache_max_entries,
            }),
            areas: Mutex::new(None),
            area_ttl: config.area_ttl(),
            fetcher,
            startup_fetcher,
            offline: config.offline,
        }
    }

    /// Returns the page for `filter` continuing after `after`. Serves the
    /// cache within the freshness window; otherwise fetches, normalizes,
    /// stores, and returns. Never fails: exhausted retries fall back to the
    /// stale cached page, then to the empty page.
    pub async fn get_page(
        &self,
        filter: &AreaFilter,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Page {
        self.page_with(&self.fetcher, filter, page_size, after).await
    }

    /// First-render convenience: `get_page(All, page_size, None)` under the
    /// longer startup deadline, returning only the items. Empty on any
    /// failure so there is always a renderable page.
    pub async fn get_initial_page(&self, page_size: usize) -> Vec<FeedItem> {
        self.page_with(&self.startup_fetcher, &AreaFilter::All, page_size, None)
            .await
            .items
    }

    async fn page_with(
        &self,
        fetcher: &ResilientFetcher,
        filter: &AreaFilter,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Page {
        if page_size == 0 {
            warn!("rejected feed request with page_size=0 for {}", filter);
            return Page::empty();
        }

        let key = CacheKey::new(filter.clone(), page_size, after.cloned());
        if let Some(page) = self.pages.get(&key).await {
            return page;
        }

        if self.offline {
            debug!("offline mode: serving cached-or-empty for {}", key);
            return self.pages.get_stale(&key).await.unwrap_or_else(Page::empty);
        }

        match fetcher
            .fetch(|| self.source.query(filter, page_size, after))
            .await
        {
            Ok(source_page) => {
                let page = normalize_page(source_page.records, page_size, source_page.next_cursor);
                self.pages.put(key, page.clone()).await;
                page
            }
            Err(e) => {
                warn!("feed fetch for {} failed: {} (serving fallback)", key, e);
                self.pages.get_stale(&key).await.unwrap_or_else(Page::empty)
            }
        }
    }

    /// Distinct, sorted area tags across the whole source, cached under
    /// their own freshness window. Stale-or-empty on failure, like pages.
    pub async fn get_distinct_areas(&self) -> Vec<String> {
        {
            let cell = self.areas.lock().await;
            if let Some((areas, stored_at)) = cell.as_ref() {
                if stored_at.elapsed() < self.area_ttl {
                    debug!("area cache hit ({} areas)", areas.len());
                    return areas.clone();
                }
            }
        }

        if self.offline {
            let cell = self.areas.lock().await;
            return cell.as_ref().map(|(areas, _)| areas.clone()).unwrap_or_default();
        }

        match self.fetcher.fetch(|| self.source.list_all()).await {
            Ok(records) => {
                let areas: Vec<String> = records
                    .iter()
                    .filter_map(|r| r.area.as_deref())
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_owned)
                    .sorted()
                    .dedup()
                    .collect();
                let mut cell = self.areas.lock().await;
                *cell = Some((areas.clone(), Instant::now()));
                areas
            }
            Err(e) => {
                warn!("area discovery failed: {} (serving fallback)", e);
                let cell = self.areas.lock().await;
                cell.as_ref().map(|(areas, _)| areas.clone()).unwrap_or_default()
            }
        }
    }

    /// Drops all cached pages and the area set. The admin panel calls this
    /// after content edits so they become visible before TTL expiry.
    pub async fn invalidate(&self) {
        self.pages.clear().await;
        *self.areas.lock().await = None;
        info!("feed caches invalidated");
    }

    pub async fn cache_metrics(&self) -> CacheMetrics {
        self.pages.metrics().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::testing::MockFeedSource;

    fn test_config() -> Config {
        Config {
            fetch_timeout_ms: 1000,
            retry_base_delay_ms: 10,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_remote_call() {
        let source = MockFeedSource::new(MockFeedSource::sample_records(6));
        let paginator = FeedPaginator::new(source, &test_config());

        let first = paginator.get_page(&AreaFilter::All, 5, None).await;
        let second = paginator.get_page(&AreaFilter::All, 5, None).await;

        assert_eq!(first, second);
        assert_eq!(paginator.source.query_calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_cache_keys_fetch_independently() {
        let source = MockFeedSource::new(MockFeedSource::sample_records(6));
        let paginator = FeedPaginator::new(source, &test_config());

        paginator.get_page(&AreaFilter::All, 5, None).await;
        paginator
            .get_page(&AreaFilter::Area("sports".to_string()), 5, None)
            .await;

        assert_eq!(paginator.source.query_calls(), 2);
    }

    #[tokio::test]
    async fn test_page_size_zero_degrades_to_empty() {
        let source = MockFeedSource::new(MockFeedSource::sample_records(6));
        let paginator = FeedPaginator::new(source, &test_config());

        let page = paginator.get_page(&AreaFilter::All, 0, None).await;

        assert_eq!(page, Page::empty());
        assert_eq!(paginator.source.query_calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_mode_never_calls_remote() {
        let source = MockFeedSource::new(MockFeedSource::sample_records(6));
        let config = Config {
            offline: true,
            ..test_config()
        };
        let paginator = FeedPaginator::new(source, &config);

        let page = paginator.get_page(&AreaFilter::All, 5, None).await;
        let items = paginator.get_initial_page(5).await;
        let areas = paginator.get_distinct_areas().await;

        assert_eq!(page, Page::empty());
        assert!(items.is_empty());
        assert!(areas.is_empty());
        assert_eq!(paginator.source.query_calls(), 0);
        assert_eq!(paginator.source.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let source = MockFeedSource::new(MockFeedSource::sample_records(6));
        let paginator = FeedPaginator::new(source, &test_config());

        paginator.get_page(&AreaFilter::All, 5, None).await;
        paginator.invalidate().await;
        paginator.get_page(&AreaFilter::All, 5, None).await;

        assert_eq!(paginator.source.query_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_page_swallows_failures() {
        let source = MockFeedSource::new(MockFeedSource::sample_records(6)).with_failures(vec![
            FeedError::Unavailable("503".to_string()),
            FeedError::Unavailable("503".to_string()),
            FeedError::Unavailable("503".to_string()),
        ]);
        let paginator = FeedPaginator::new(source, &test_config());

        let items = paginator.get_initial_page(5).await;

        assert!(items.is_empty());
    }
}
