pub mod settings;

pub use settings::Config;

use crate::error::FeedError;
use std::sync::Arc;

/// Loads and returns the feed configuration as an `Arc<Config>`.
/// Centralizes `.env` loading and validation.
pub fn load_config() -> Result<Arc<Config>, FeedError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env();

    if config.source_url.is_empty() {
        return Err(FeedError::Config(
            "FEED_SOURCE_URL cannot be empty".to_string(),
        ));
    }
    if config.page_ttl_secs == 0 {
        return Err(FeedError::Config(
            "FEED_PAGE_TTL_SECS must be positive".to_string(),
        ));
    }
    if config.cache_max_entries == 0 {
        return Err(FeedError::Config(
            "FEED_CACHE_MAX_ENTRIES must be positive".to_string(),
        ));
    }

    config.validate_and_log();

    Ok(Arc::new(config))
}
