//! Search parameters shared by every site adapter.
use serde::{Deserialize, Serialize};

/// Pagination position of a search.
///
/// Which variant is meaningful depends on the adapter: page-number sites use `Page`, keyset sites
/// use `Token`. Both read `Start` as "first page".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageCursor {
    #[default]
    Start,
    /// 1-based page number.
    Page(u32),
    /// Opaque keyset token copied from the previous response.
    Token(String),
}

impl PageCursor {
    /// Page number to request, `Start` being page 1.
    pub const fn page_number(&self) -> u32 {
        match self {
            Self::Page(n) => *n,
            Self::Start | Self::Token(_) => 1,
        }
    }

    /// Keyset token to request, empty for the first page.
    pub fn token(&self) -> &str {
        match self {
            Self::Token(token) => token,
            Self::Start | Self::Page(_) => "",
        }
    }
}

/// Sort order requested from sites that support more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageOrder {
    #[default]
    Date,
    Popular,
}

/// Parameters of one search session. Only the cursor changes once the session started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    /// Additional keywords, AND-combined with `keyword` on sites that support it.
    pub extra_keywords: Vec<String>,
    pub show_explicit: bool,
    pub page_size: u16,
    /// 0-based index into the adapter's categories (0 is always latest/search).
    pub menu_index: usize,
    pub order: ImageOrder,
    pub cursor: PageCursor,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            extra_keywords: Vec::new(),
            show_explicit: false,
            page_size: 60,
            menu_index: 0,
            order: ImageOrder::Date,
            cursor: PageCursor::Start,
        }
    }
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extra_keywords<S: ToString>(mut self, keywords: &[S]) -> Self {
        self.extra_keywords = keywords.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub const fn show_explicit(mut self, show: bool) -> Self {
        self.show_explicit = show;
        self
    }

    #[must_use]
    pub const fn page_size(mut self, size: u16) -> Self {
        self.page_size = size;
        self
    }

    #[must_use]
    pub const fn menu_index(mut self, index: usize) -> Self {
        self.menu_index = index;
        self
    }

    #[must_use]
    pub const fn order(mut self, order: ImageOrder) -> Self {
        self.order = order;
        self
    }
}
