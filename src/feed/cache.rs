//! Short-lived in-memory page cache.
//!
//! Bounded key -> (page, stored-at) store with a fixed freshness window and
//! FIFO capacity eviction. Freshness is checked lazily on read; an entry
//! past its window reports absent but is retained until overwritten or
//! pushed out by capacity, so the fallback path can still serve it.

use crate::feed::item::{AreaFilter, Cursor, Page};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Configuration for the page cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Freshness window for entries
    pub ttl: Duration,
    /// Maximum number of entries before FIFO eviction
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 64,
        }
    }
}

/// Cache key: filter, page size, and cursor identity
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    pub filter: AreaFilter,
    pub page_size: usize,
    pub cursor: Option<Cursor>,
}

impl CacheKey {
    pub fn new(filter: AreaFilter, page_size: usize, cursor: Option<Cursor>) -> Self {
        Self {
            filter,
            page_size,
            cursor,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cursor {
            Some(cursor) => write!(f, "{}@{}+{}", self.filter, self.page_size, cursor),
            None => write!(f, "{}@{}", self.filter, self.page_size),
        }
    }
}

/// Cache entry storing a page with its insertion timestamp
#[derive(Debug, Clone)]
struct CacheEntry {
    page: Page,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Counters for monitoring cache behavior
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Internal storage: entries plus insertion order for FIFO eviction
struct CacheStorage {
    entries: HashMap<CacheKey, CacheEntry>,
    insertion_order: VecDeque<CacheKey>,
}

/// TTL page cache. All read and insert-then-maybe-evict sequences are
/// atomic under a single mutex; contention is low enough that nothing
/// finer-grained is warranted.
pub struct PageCache {
    storage: Mutex<CacheStorage>,
    metrics: Mutex<CacheMetrics>,
    config: CacheConfig,
}

impl PageCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            storage: Mutex::new(CacheStorage {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            metrics: Mutex::new(CacheMetrics::default()),
            config,
        }
    }

    /// Fresh-only read: an entry older than the freshness window reports
    /// absent, forcing the caller to re-fetch.
    pub async fn get(&self, key: &CacheKey) -> Option<Page> {
        let storage = self.storage.lock().await;
        let page = storage
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.config.ttl))
            .map(|entry| entry.page.clone());
        drop(storage);

        let mut metrics = self.metrics.lock().await;
        if page.is_some() {
            metrics.hits += 1;
            debug!("page cache hit for {}", key);
        } else {
            metrics.misses += 1;
            debug!("page cache miss for {}", key);
        }
        page
    }

    /// Age-ignoring read for the fallback path: a stale page beats an
    /// empty one when the live fetch has failed.
    pub async fn get_stale(&self, key: &CacheKey) -> Option<Page> {
        let storage = self.storage.lock().await;
        storage.entries.get(key).map(|entry| entry.page.clone())
    }

    /// Insert or overwrite. Overwriting refreshes the timestamp and moves
    /// the key to the back of the insertion order, then oldest-inserted
    /// entries are evicted while the capacity bound is exceeded.
    pub async fn put(&self, key: CacheKey, page: Page) {
        let mut evicted = 0u64;
        {
            let mut storage = self.storage.lock().await;

            if storage.entries.contains_key(&key) {
                if let Some(pos) = storage.insertion_order.iter().position(|k| k == &key) {
                    storage.insertion_order.remove(pos);
                }
            }
            storage.entries.insert(
                key.clone(),
                CacheEntry {
                    page,
                    stored_at: Instant::now(),
                },
            );
            storage.insertion_order.push_back(key);

            while storage.entries.len() > self.config.max_entries {
                match storage.insertion_order.pop_front() {
                    Some(oldest) => {
                        storage.entries.remove(&oldest);
                        evicted += 1;
                        debug!("evicted oldest page cache entry {}", oldest);
                    }
                    None => break,
                }
            }
        }

        if evicted > 0 {
            self.metrics.lock().await.evictions += evicted;
        }
    }

    /// Drops every entry. Used when admin edits invalidate content.
    pub async fn clear(&self) {
        let mut storage = self.storage.lock().await;
        storage.entries.clear();
        storage.insertion_order.clear();
    }

    pub async fn metrics(&self) -> CacheMetrics {
        let mut metrics = self.metrics.lock().await;
        metrics.entries = self.storage.lock().await.entries.len();
        metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::item::FeedItem;
    use chrono::DateTime;

    fn key(tag: &str) -> CacheKey {
        CacheKey::new(AreaFilter::Area(tag.to_string()), 10, None)
    }

    fn page(id: &str) -> Page {
        Page {
            items: vec![FeedItem {
                id: id.to_string(),
                headline: format!("Headline {}", id),
                summary: String::new(),
                image_url: String::new(),
                source_name: String::new(),
                external_url: String::new(),
                area: String::new(),
                published_at: DateTime::UNIX_EPOCH,
            }],
            next_cursor: None,
            has_more: false,
        }
    }

    #[tokio::test]
    async fn test_get_after_put_returns_page_unmodified() {
        let cache = PageCache::new(CacheConfig::default());
        let stored = page("a");

        cache.put(key("news"), stored.clone()).await;

        assert_eq!(cache.get(&key("news")).await, Some(stored));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = PageCache::new(CacheConfig {
            ttl: Duration::from_secs(300),
            max_entries: 64,
        });
        cache.put(key("news"), page("a")).await;

        tokio::time::advance(Duration::from_secs(301)).await;

        assert_eq!(cache.get(&key("news")).await, None);
        // Stale value survives for the fallback path
        assert_eq!(cache.get_stale(&key("news")).await, Some(page("a")));
    }

    #[tokio::test]
    async fn test_fifo_eviction_removes_earliest_inserted() {
        let cache = PageCache::new(CacheConfig {
            ttl: Duration::from_secs(300),
            max_entries: 2,
        });

        cache.put(key("first"), page("1")).await;
        cache.put(key("second"), page("2")).await;
        // Access does not reorder: FIFO, not LRU
        assert!(cache.get(&key("first")).await.is_some());

        cache.put(key("third"), page("3")).await;

        assert_eq!(cache.get(&key("first")).await, None);
        assert!(cache.get(&key("second")).await.is_some());
        assert!(cache.get(&key("third")).await.is_some());

        let metrics = cache.metrics().await;
        assert_eq!(metrics.evictions, 1);
        assert_eq!(metrics.entries, 2);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_double_count_capacity() {
        let cache = PageCache::new(CacheConfig {
            ttl: Duration::from_secs(300),
            max_entries: 2,
        });

        cache.put(key("a"), page("1")).await;
        cache.put(key("b"), page("2")).await;
        cache.put(key("a"), page("1b")).await;

        let metrics = cache.metrics().await;
        assert_eq!(metrics.evictions, 0);
        assert_eq!(metrics.entries, 2);
        assert_eq!(cache.get(&key("a")).await, Some(page("1b")));
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let cache = PageCache::new(CacheConfig::default());
        cache.put(key("a"), page("1")).await;

        cache.clear().await;

        assert_eq!(cache.get(&key("a")).await, None);
        assert_eq!(cache.get_stale(&key("a")).await, None);
    }

    #[tokio::test]
    async fn test_metrics_track_hits_and_misses() {
        let cache = PageCache::new(CacheConfig::default());

        cache.get(&key("a")).await;
        cache.put(key("a"), page("1")).await;
        cache.get(&key("a")).await;

        let metrics = cache.metrics().await;
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate(), 0.5);
    }
}
