pub mod cache;
pub mod fetcher;
pub mod item;
pub mod paginator;

pub use item::{AreaFilter, Cursor, FeedItem, Page};
pub use paginator::FeedPaginator;
