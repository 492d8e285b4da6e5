//! HTTP implementation of the remote feed source against the document
//! store's REST endpoints.

use crate::error::{FeedError, Result};
use crate::feed::item::{AreaFilter, Cursor, RawRecord};
use crate::source::{RemoteFeedSource, SourcePage};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use url::Url;

// One shared client for the process. No client-side timeout: the resilient
// fetcher's race is the single timeout authority.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Deserialize)]
struct FeedQueryResponse {
    #[serde(default)]
    records: Vec<RawRecord>,
    #[serde(default)]
    next_cursor: Option<Cursor>,
}

#[derive(Debug, Deserialize)]
struct FeedListResponse {
    #[serde(default)]
    records: Vec<RawRecord>,
}

/// Feed source backed by the document store's REST surface:
/// `GET {base}/feed` for pages and `GET {base}/feed/all` for discovery.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    feed_url: Url,
    list_url: Url,
}

impl HttpFeedSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| FeedError::Config(format!("invalid FEED_SOURCE_URL {}: {}", base_url, e)))?;
        let feed_url = base
            .join("feed")
            .map_err(|e| FeedError::Config(format!("cannot build feed endpoint: {}", e)))?;
        let list_url = base
            .join("feed/all")
            .map_err(|e| FeedError::Config(format!("cannot build feed/all endpoint: {}", e)))?;
        Ok(Self { feed_url, list_url })
    }
}

fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = format!("{} from {}", status, resp.url());
    match status.as_u16() {
        429 | 502 | 503 | 504 => Err(FeedError::Unavailable(message)),
        _ => Err(FeedError::Network(message)),
    }
}

#[async_trait]
impl RemoteFeedSource for HttpFeedSource {
    async fn query(
        &self,
        filter: &AreaFilter,
        page_size: usize,
        after: Option<&Cursor>,
    ) -> Result<SourcePage> {
        let mut request = HTTP_CLIENT
            .get(self.feed_url.clone())
            .query(&[("limit", page_size.to_string())]);
        if let AreaFilter::Area(tag) = filter {
            request = request.query(&[("area", tag.as_str())]);
        }
        if let Some(cursor) = after {
            request = request.query(&[("after", cursor.as_str())]);
        }

        let resp = check_status(request.send().await.map_err(FeedError::from)?)?;
        let body: FeedQueryResponse = resp.json().await.map_err(FeedError::from)?;
        Ok(SourcePage {
            records: body.records,
            next_cursor: body.next_cursor,
        })
    }

    async fn list_all(&self) -> Result<Vec<RawRecord>> {
        let request = HTTP_CLIENT.get(self.list_url.clone());
        let resp = check_status(request.send().await.map_err(FeedError::from)?)?;
        let body: FeedListResponse = resp.json().await.map_err(FeedError::from)?;
        Ok(body.records)
    }
}
