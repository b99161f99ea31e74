//! Adapter for `https://konachan.com` and other Moebooru imageboards.
//!
//! Moebooru paginates by page number and answers with a bare JSON list of posts. Sites with a
//! filtered mirror (konachan.net) are listed from the mirror whenever explicit content is hidden.
use std::sync::Arc;

use async_trait::async_trait;
use moeloader_common::{
    cancel::CancelToken,
    item::{
        rating::{ExplicitRule, Rating},
        ItemDate, MediaUrl, MediaVariant, ResultItem, ResultPage, SuggestItem,
    },
    log::{debug, warn},
    query::{PageCursor, SearchQuery},
    serde_json::{self, Value},
};

use crate::{
    error::ExtractorError,
    extractor_config::SiteConfig,
    sites::{
        suggest::{parse_suggestions, SuggestOrder},
        SiteAdapter, SiteCapabilities,
    },
    transport::{HttpRequest, Transport},
};

use self::models::KonachanPost;

mod models;

const SUGGEST_LIMIT: u8 = 15;

pub struct MoebooruAdapter {
    config: SiteConfig,
    transport: Arc<dyn Transport>,
}

impl MoebooruAdapter {
    pub fn new(config: SiteConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Builds the listing request for the page the query's cursor points at.
    pub fn page_request(&self, query: &SearchQuery) -> HttpRequest {
        let root = self.config.listing_root(query.show_explicit);
        HttpRequest::get(format!("{root}/post.json"))
            .query("page", query.cursor.page_number())
            .query("limit", self.limit(query))
            .query("tags", query.keyword.trim())
    }

    fn limit(&self, query: &SearchQuery) -> u16 {
        query.page_size.min(self.config.max_page_size)
    }

    /// Maps a `post.json` payload. Returns the items and how many raw entries the page held.
    pub fn map_posts(
        &self,
        json: Value,
        show_explicit: bool,
    ) -> Result<(Vec<ResultItem>, usize), ExtractorError> {
        let Value::Array(entries) = json else {
            return Err(ExtractorError::shape("post list is not a JSON array"));
        };

        let raw_count = entries.len();
        let root = self.config.listing_root(show_explicit);

        let items = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<KonachanPost>(entry.clone()) {
                Ok(post) => Some(self.map_post(post, entry, root)),
                Err(e) => {
                    warn!("Skipping unreadable {} entry: {}", self.config.name, e);
                    None
                }
            })
            .collect();

        Ok((items, raw_count))
    }

    fn map_post(&self, post: KonachanPost, raw: Value, root: &str) -> ResultItem {
        let detail_url = format!("{root}/post/show/{}", post.id);

        let mut item = ResultItem {
            site: self.config.name.clone(),
            id: post.id,
            width: post.width,
            height: post.height,
            uploader: post.author,
            uploader_id: post.creator_id,
            score: post.score,
            is_explicit: ExplicitRule::ExplicitCode.is_explicit(&post.rating),
            rating: Rating::from_rating_str(&post.rating),
            tags: post
                .tags
                .split_whitespace()
                .map(ToString::to_string)
                .collect(),
            date: ItemDate::parse(&post.created_at),
            source: post.source,
            raw,
            ..ResultItem::default()
        };

        item.add_url(
            MediaVariant::Thumbnail,
            MediaUrl::new(post.preview_url, None, None),
        );
        item.add_url(
            MediaVariant::Medium,
            MediaUrl::new(post.sample_url, None, None),
        );
        item.add_url(
            MediaVariant::Original,
            MediaUrl::new(
                post.file_url,
                Some(detail_url.clone()),
                (post.file_size > 0).then_some(post.file_size),
            ),
        );
        item.detail_url = detail_url;
        item
    }
}

#[async_trait]
impl SiteAdapter for MoebooruAdapter {
    fn site(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn capabilities(&self) -> SiteCapabilities {
        SiteCapabilities::KEYWORD
            | SiteCapabilities::RATING
            | SiteCapabilities::RESOLUTION
            | SiteCapabilities::SCORE
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        cancel: &CancelToken,
    ) -> Result<ResultPage, ExtractorError> {
        if query.menu_index != 0 {
            return Err(ExtractorError::UnsupportedOperation);
        }

        let request = self.page_request(query);
        let json = self.transport.send_json(&request, cancel).await?;
        let (items, raw_count) = self.map_posts(json, query.show_explicit)?;

        let page = query.cursor.page_number();
        let limit = usize::from(self.limit(query));
        debug!(
            "{} page {}: {} items out of {} entries",
            self.config.name,
            page,
            items.len(),
            raw_count
        );

        Ok(ResultPage {
            items,
            next_cursor: PageCursor::Page(page.saturating_add(1)),
            has_more: raw_count > 0 && raw_count >= limit,
        })
    }

    async fn suggest(
        &self,
        partial: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<SuggestItem>, ExtractorError> {
        let partial = partial.trim();
        if partial.is_empty() {
            return Ok(Vec::new());
        }

        let request = HttpRequest::get(format!("{}/tag.json", self.config.base_url))
            .query("limit", SUGGEST_LIMIT)
            .query("order", "count")
            .query("name", partial);

        let json = self.transport.send_json(&request, cancel).await?;
        Ok(parse_suggestions(json, SuggestOrder::Ranked))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use moeloader_common::{
        cancel::CancelToken,
        item::{ItemDate, MediaVariant},
        query::{PageCursor, SearchQuery},
        serde_json::json,
    };

    use super::MoebooruAdapter;
    use crate::{
        error::ExtractorError,
        extractor_config::DEFAULT_SITES,
        sites::{Credential, SiteAdapter},
        transport::mock::{MockReply, MockTransport},
    };

    fn adapter(mock: &Arc<MockTransport>) -> MoebooruAdapter {
        MoebooruAdapter::new(DEFAULT_SITES["konachan"].clone(), mock.clone())
    }

    #[tokio::test]
    async fn last_page_number_does_not_overflow() {
        let mock = Arc::new(MockTransport::new());
        mock.reply("https://konachan.com/post.json", MockReply::Json(json!([])));

        let mut query = SearchQuery::new("scenic");
        query.cursor = PageCursor::Page(u32::MAX);
        let page = adapter(&mock)
            .fetch_page(&query, &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(page.next_cursor, PageCursor::Page(u32::MAX));
        assert!(!page.has_more);
        assert_eq!(
            mock.requests()[0].query_value("page"),
            Some(u32::MAX.to_string().as_str())
        );
    }

    #[tokio::test]
    async fn maps_full_entry() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            "https://konachan.com/post.json",
            MockReply::Json(json!([{
                "id": 331_234,
                "width": 1920,
                "height": 1080,
                "score": 57,
                "author": "someone",
                "creator_id": 42,
                "tags": "long_hair  scenic original",
                "rating": "e",
                "created_at": 1_616_600_000,
                "preview_url": "https://konachan.com/p.jpg",
                "sample_url": "https://konachan.com/s.jpg",
                "file_url": "https://konachan.com/f.png",
                "file_size": 123_456,
                "source": "https://example.test/src"
            }])),
        );

        let query = SearchQuery::new("scenic").show_explicit(true).page_size(1);
        let page = adapter(&mock)
            .fetch_page(&query, &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.site, "konachan");
        assert_eq!(item.id, 331_234);
        assert_eq!((item.width, item.height), (1920, 1080));
        assert_eq!(item.uploader_id, "42");
        assert!(item.is_explicit);
        assert_eq!(item.tags, vec!["long_hair", "scenic", "original"]);
        assert!(matches!(item.date, ItemDate::Parsed(_)));
        assert_eq!(item.detail_url, "https://konachan.com/post/show/331234");

        let original = item.url(MediaVariant::Original).unwrap();
        assert_eq!(original.referer.as_deref(), Some(item.detail_url.as_str()));
        assert_eq!(original.size, Some(123_456));

        assert_eq!(page.next_cursor, PageCursor::Page(2));
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn missing_fields_are_zero() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            "https://konachan.net/post.json",
            MockReply::Json(json!([{"id": null, "rating": "s"}, 17])),
        );

        let page = adapter(&mock)
            .fetch_page(&SearchQuery::new(""), &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.id, 0);
        assert_eq!(item.width, 0);
        assert_eq!(item.score, 0);
        assert_eq!(item.uploader, "");
        assert!(item.tags.is_empty());
        assert!(!item.is_explicit);
        assert_eq!(item.date, ItemDate::Unknown);
        assert!(item.urls.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn hidden_explicit_uses_safe_mirror() {
        let mock = Arc::new(MockTransport::new());
        mock.reply("https://konachan.net/post.json", MockReply::Json(json!([])));

        let mut query = SearchQuery::new(" sky ").page_size(500).show_explicit(false);
        query.cursor = PageCursor::Page(3);

        let page = adapter(&mock)
            .fetch_page(&query, &CancelToken::never())
            .await
            .unwrap();

        let sent = &mock.requests()[0];
        assert_eq!(sent.url, "https://konachan.net/post.json");
        assert_eq!(sent.query_value("page"), Some("3"));
        assert_eq!(sent.query_value("limit"), Some("100"));
        assert_eq!(sent.query_value("tags"), Some("sky"));
        assert_eq!(page.next_cursor, PageCursor::Page(4));
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn object_root_is_shape_error() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            "https://konachan.net/post.json",
            MockReply::Json(json!({"success": false})),
        );

        let res = adapter(&mock)
            .fetch_page(&SearchQuery::new("x"), &CancelToken::never())
            .await;
        assert!(matches!(res, Err(ExtractorError::ResponseShape { .. })));
    }

    #[tokio::test]
    async fn suggest_keeps_api_order() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            "https://konachan.com/tag.json",
            MockReply::Json(json!([
                {"name": "long_hair", "count": 5},
                {"name": "long_sleeves", "count": 9},
            ])),
        );

        let adapter = adapter(&mock);
        let words = adapter
            .suggest("long", &CancelToken::never())
            .await
            .unwrap();
        assert_eq!(words[0].word, "long_hair");
        assert_eq!(words[1].count, 9);

        let sent = &mock.requests()[0];
        assert_eq!(sent.query_value("limit"), Some("15"));
        assert_eq!(sent.query_value("order"), Some("count"));
        assert_eq!(sent.query_value("name"), Some("long"));

        assert!(adapter
            .suggest("   ", &CancelToken::never())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn no_account_support() {
        let mock = Arc::new(MockTransport::new());
        let adapter = adapter(&mock);
        assert!(matches!(
            adapter
                .authenticate(Credential::Token("t".to_string()))
                .await,
            Err(ExtractorError::AuthUnsupported)
        ));
        assert!(!adapter.is_authenticated());
    }
}
