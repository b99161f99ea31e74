//! Site adapters: one implementation per remote API family, all behind [`SiteAdapter`].
//!
//! An adapter turns a [`SearchQuery`] into the request its site understands and the site's JSON
//! back into [`ResultPage`]s. Adapters never mutate the query: the cursor for the next page is
//! returned inside the page and applied by whoever drives the pagination.
use async_trait::async_trait;
use moeloader_common::{
    cancel::CancelToken,
    item::{ResultItem, ResultPage, SuggestItem},
    query::SearchQuery,
};

use crate::{error::ExtractorError, extractor_config::SiteConfig, settings::ACCESS_TOKEN};

pub use self::caps::{Category, SiteCapabilities, LATEST};

pub mod caps;
#[cfg(feature = "moebooru")]
pub mod konachan;
#[cfg(feature = "sankaku")]
pub mod sankaku;
pub mod suggest;

/// Credentials obtained by an external login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    /// `(name, value)` pairs captured from the site's front-end.
    Cookies(Vec<(String, String)>),
}

impl Credential {
    /// The bearer token carried by this credential, if any.
    ///
    /// Cookie lists carry it as a cookie named `accessToken`, matched case-insensitively.
    pub fn access_token(&self) -> Option<&str> {
        let token = match self {
            Self::Token(token) => token.as_str(),
            Self::Cookies(cookies) => cookies
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(ACCESS_TOKEN))
                .map(|(_, value)| value.as_str())?,
        };
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }
}

/// Result of starring an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarOutcome {
    pub starred: bool,
    /// Favorite count reported after the change, when the site sends one.
    pub fav_count: Option<i64>,
}

#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Configured site name, also stamped on every item.
    fn site(&self) -> &str;

    fn config(&self) -> &SiteConfig;

    fn capabilities(&self) -> SiteCapabilities;

    /// Sub-feeds selectable through `SearchQuery::menu_index`.
    fn categories(&self) -> Vec<Category> {
        vec![LATEST]
    }

    /// Fetches the page the query's cursor points at.
    ///
    /// Malformed entries and fields degrade to zero values; only an unusable payload root fails
    /// the call.
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        cancel: &CancelToken,
    ) -> Result<ResultPage, ExtractorError>;

    /// Keyword completions for `partial`, in the order the site ranks them.
    async fn suggest(
        &self,
        partial: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<SuggestItem>, ExtractorError>;

    async fn authenticate(&self, _credential: Credential) -> Result<(), ExtractorError> {
        Err(ExtractorError::AuthUnsupported)
    }

    async fn logout(&self) -> Result<(), ExtractorError> {
        Err(ExtractorError::AuthUnsupported)
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    async fn star(
        &self,
        _item: &ResultItem,
        _cancel: &CancelToken,
    ) -> Result<StarOutcome, ExtractorError> {
        Err(ExtractorError::UnsupportedOperation)
    }
}
