//! Normalized representation of a listing entry
//!
//! # ResultItem
//! A [`ResultItem` struct](ResultItem) is what every site adapter turns a remote post into, no
//! matter how the remote JSON looks. Fields that the remote payload doesn't carry (or carries in
//! an unusable shape) are left at their zero value.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::{collections::HashMap, fmt::Debug};

use crate::query::PageCursor;

use self::rating::Rating;

pub mod rating;

/// Size classes a site may serve for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaVariant {
    Thumbnail,
    Medium,
    Original,
}

/// Where to fetch one media variant from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrl {
    pub url: String,
    /// Some CDNs refuse hotlinked requests without it.
    pub referer: Option<String>,
    /// Byte size reported by the API, if any.
    pub size: Option<u64>,
}

impl MediaUrl {
    pub fn new(url: impl Into<String>, referer: Option<String>, size: Option<u64>) -> Self {
        Self {
            url: url.into(),
            referer,
            size,
        }
    }
}

/// Creation date of an item, kept verbatim when it can't be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemDate {
    Parsed(DateTime<Utc>),
    Raw(String),
    #[default]
    Unknown,
}

impl ItemDate {
    /// Builds a date from unix seconds. Zero and out of range values are `Unknown`.
    pub fn from_unix(secs: i64) -> Self {
        if secs == 0 {
            return Self::Unknown;
        }
        DateTime::from_timestamp(secs, 0).map_or(Self::Unknown, Self::Parsed)
    }

    /// Accepts unix seconds, RFC 3339 and `%Y-%m-%d %H:%M:%S` (UTC).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Unknown;
        }
        if let Ok(secs) = raw.parse::<i64>() {
            return Self::from_unix(secs);
        }
        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Self::Parsed(date.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Self::Parsed(date.and_utc());
        }
        Self::Raw(raw.to_string())
    }

    pub const fn parsed(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Parsed(date) => Some(date),
            _ => None,
        }
    }
}

/// Catchall model for one listing entry of any supported site.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ResultItem {
    /// Configured name of the site this item was listed by (e.g. `konachan`).
    pub site: String,
    /// ID given by the site. Only unique within one site.
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub uploader: String,
    pub uploader_id: String,
    pub score: i64,
    pub fav_count: i64,
    /// Whether the authenticated account already starred this item.
    pub is_favorited: bool,
    /// Adapter-normalized explicit flag, see [`ExplicitRule`](rating::ExplicitRule).
    pub is_explicit: bool,
    pub rating: Rating,
    /// Tags in the order the site sent them. Duplicates are kept.
    pub tags: Vec<String>,
    pub date: ItemDate,
    pub detail_url: String,
    pub source: String,
    /// Short notice for the presentation layer, e.g. when the site hides the item from guests.
    pub tip: Option<String>,
    pub urls: HashMap<MediaVariant, MediaUrl>,
    /// Unmodified JSON entry the item was built from.
    pub raw: Value,
}

impl Debug for ResultItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultItem")
            .field("Site", &self.site)
            .field("ID", &self.id)
            .field("Size", &format_args!("{}x{}", self.width, self.height))
            .field("Uploader", &self.uploader)
            .field("Score", &self.score)
            .field("Explicit", &self.is_explicit)
            .field("Date", &self.date)
            .field("URLs", &self.urls)
            .field("Tag List", &self.tags)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ResultItem {
    fn eq(&self, other: &Self) -> bool {
        self.site == other.site && self.id == other.id
    }
}

impl Eq for ResultItem {}

impl ResultItem {
    /// Registers a variant, ignoring empty URLs so a null field never yields a bogus entry.
    pub fn add_url(&mut self, variant: MediaVariant, url: MediaUrl) {
        if !url.url.is_empty() {
            self.urls.insert(variant, url);
        }
    }

    pub fn url(&self, variant: MediaVariant) -> Option<&MediaUrl> {
        self.urls.get(&variant)
    }

    /// The variant used for previews: thumbnail, falling back to medium.
    pub fn loadable_url(&self) -> Option<(MediaVariant, &MediaUrl)> {
        [MediaVariant::Thumbnail, MediaVariant::Medium]
            .into_iter()
            .find_map(|variant| self.url(variant).map(|url| (variant, url)))
    }
}

/// One adapter call worth of items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPage {
    pub items: Vec<ResultItem>,
    /// Cursor to send for the page after this one.
    pub next_cursor: PageCursor,
    /// `false` once the site signalled that nothing follows this page.
    pub has_more: bool,
}

/// A keyword completion and how many posts use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestItem {
    pub word: String,
    pub count: u64,
}
