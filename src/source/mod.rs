//! Remote feed source boundary.
//!
//! The document store is an opaque, possibly slow, possibly failing
//! paginated collaborator. This trait is the only coupling the retrieval
//! layer has to it; the crate imposes its own deadlines regardless of any
//! timeout the source enforces on its side.

pub mod http;

pub use http::HttpFeedSource;

use crate::error::Result;
use crate::feed::item::{AreaFilter, Cursor, RawRecord};
use async_trait::async_trait;

/// One raw page as the source returns it: records in the source's
/// publish-time-descending order plus the continuation token, if any.
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub records: Vec<RawRecord>,
    pub next_cursor: Option<Cursor>,
}

#[async_trait]
pub trait RemoteFeedSource: Send + Sync {
    /// Returns up to `page_size` records matching `filter`, continuing
    /// after `after` (`None` means from the beginning).
    async fn query(
        &self,
        filter: &AreaFilter,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Result<SourcePage>;

    /// Full scan used for area discovery.
    async fn list_all(&self) -> Result<Vec<RawRecord>>;
}
