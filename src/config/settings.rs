use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the document store's feed endpoints
    pub source_url: String,
    /// Freshness window for cached pages, in seconds
    pub page_ttl_secs: u64,
    /// Freshness window for the cached area set, in seconds
    pub area_ttl_secs: u64,
    /// Capacity bound for the page cache (FIFO eviction past this)
    pub cache_max_entries: usize,
    /// Per-attempt deadline for remote calls, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Longer per-attempt deadline used for the initial/server-rendered page
    pub startup_fetch_timeout_ms: u64,
    /// Retries after the first attempt, for transient failures only
    pub max_retries: u32,
    /// Linear backoff base: the n-th retry sleeps base * n
    pub retry_base_delay_ms: u64,
    /// Skip remote calls entirely and serve cached-or-empty results
    pub offline: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            source_url: env::var("FEED_SOURCE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            page_ttl_secs: env::var("FEED_PAGE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            area_ttl_secs: env::var("FEED_AREA_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),
            cache_max_entries: env::var("FEED_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .unwrap_or(64),
            fetch_timeout_ms: env::var("FEED_FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            startup_fetch_timeout_ms: env::var("FEED_STARTUP_FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15000),
            max_retries: env::var("FEED_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            retry_base_delay_ms: env::var("FEED_RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .unwrap_or(250),
            offline: env::var("FEED_OFFLINE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        }
    }

    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.page_ttl_secs)
    }

    pub fn area_ttl(&self) -> Duration {
        Duration::from_secs(self.area_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn startup_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_fetch_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn validate_and_log(&self) {
        log::info!(
            "Feed config: source={} page_ttl={}s area_ttl={}s cache_cap={} timeout={}ms startup_timeout={}ms retries={} base_delay={}ms offline={}",
            self.source_url,
            self.page_ttl_secs,
            self.area_ttl_secs,
            self.cache_max_entries,
            self.fetch_timeout_ms,
            self.startup_fetch_timeout_ms,
            self.max_retries,
            self.retry_base_delay_ms,
            self.offline,
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_url: "http://127.0.0.1:8080".to_string(),
            page_ttl_secs: 300,
            area_ttl_secs: 600,
            cache_max_entries: 64,
            fetch_timeout_ms: 4000,
            startup_fetch_timeout_ms: 15000,
            max_retries: 2,
            retry_base_delay_ms: 250,
            offline: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = Config::default();
        assert_eq!(config.page_ttl(), Duration::from_secs(300));
        assert_eq!(config.area_ttl(), Duration::from_secs(600));
        assert!(config.startup_fetch_timeout() > config.fetch_timeout());
        assert!(!config.offline);
    }
}
