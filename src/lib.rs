pub mod config;
pub mod error;
pub mod feed;
pub mod source;
pub mod testing; // Scripted mock source for tests and downstream consumers

// Re-export the public surface of the retrieval layer
pub use config::{load_config, Config};
pub use error::{FeedError, Result};
pub use feed::cache::CacheMetrics;
pub use feed::item::{AreaFilter, Cursor, FeedItem, Page, RawRecord};
pub use feed::paginator::FeedPaginator;
pub use source::{HttpFeedSource, RemoteFeedSource, SourcePage};
