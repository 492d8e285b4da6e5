//! Feed data model and raw-record normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque continuation token marking a position in the source's ordering.
/// Produced by the remote source and passed back verbatim; never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Cursor(token.to_string())
    }
}

/// Feed filter: the `"all"` wildcard or an opaque area tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AreaFilter {
    All,
    Area(String),
}

impl AreaFilter {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            AreaFilter::All
        } else {
            AreaFilter::Area(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AreaFilter::All => "all",
            AreaFilter::Area(tag) => tag,
        }
    }
}

impl fmt::Display for AreaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record as the document store returns it. Every display field is
/// optional on the wire; normalization makes them total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Normalized unit of content. No field is ever null: missing display
/// fields become empty strings and a missing publish time becomes the
/// epoch, so the rendering layer never branches on absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub headline: String,
    pub summary: String,
    pub image_url: String,
    pub source_name: String,
    pub external_url: String,
    pub area: String,
    pub published_at: DateTime<Utc>,
}

impl FeedItem {
    /// Normalizes a raw record. Records without a usable id are rejected:
    /// they cannot satisfy the page-unique-id invariant.
    pub fn from_record(record: RawRecord) -> Option<FeedItem> {
        let id = record.id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
        Some(FeedItem {
            id,
            headline: record.headline.unwrap_or_default(),
            summary: record.summary.unwrap_or_default(),
            image_url: record.image_url.unwrap_or_default(),
            source_name: record.source_name.unwrap_or_default(),
            external_url: record.external_url.unwrap_or_default(),
            area: record.area.map(|a| a.trim().to_string()).unwrap_or_default(),
            published_at: record.published_at.unwrap_or(DateTime::UNIX_EPOCH),
        })
    }
}

/// One page of feed results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl Page {
    /// The degraded result every failure path bottoms out in.
    pub fn empty() -> Self {
        Page {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

/// Builds a `Page` from one raw source response.
///
/// Exhaustion is judged on the raw record count, not the normalized item
/// count, so a page thinned by malformed records still paginates through.
/// Items are ordered publish-time descending, ties broken by id; duplicate
/// ids keep the first occurrence.
pub fn normalize_page(
    records: Vec<RawRecord>,
    page_size: usize,
    next_cursor: Option<Cursor>,
) -> Page {
    let raw_len = records.len();

    let mut seen = HashSet::new();
    let mut items: Vec<FeedItem> = records
        .into_iter()
        .filter_map(FeedItem::from_record)
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    items.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let has_more = raw_len >= page_size && next_cursor.is_some();
    Page {
        items,
        next_cursor: if has_more { next_cursor } else { None },
        has_more,
    }
}
