//! Adapter for `https://chan.sankakucomplex.com`, through the v2 keyset API.
//!
//! Pages are addressed by an opaque `next` token copied from the previous response. Requests carry
//! the account's bearer token (when logged in) and the beta front-end as referer, which the API
//! requires. The favorites feed resolves the account name first and then lists `Fav:<name>`.
use std::sync::Arc;

use async_trait::async_trait;
use moeloader_common::{
    cancel::CancelToken,
    item::{
        rating::{ExplicitRule, Rating},
        ItemDate, MediaUrl, MediaVariant, ResultItem, ResultPage, SuggestItem,
    },
    join_tags,
    log::{debug, info, warn},
    query::{ImageOrder, PageCursor, SearchQuery},
    serde_json::{self, Value},
    underscore_tag,
};

use crate::{
    error::ExtractorError,
    extractor_config::SiteConfig,
    settings::{SiteSettings, ACCESS_TOKEN},
    sites::{
        suggest::{parse_suggestions, SuggestOrder},
        Category, Credential, SiteAdapter, SiteCapabilities, StarOutcome, LATEST,
    },
    transport::{HttpRequest, Transport},
};

use self::models::{SankakuFavorite, SankakuMe, SankakuPost};

mod models;

/// Tag that restricts a listing to safe posts. Must come before any user keyword.
pub const SAFETY_FILTER: &str = "rating:safe";

const FAVORITES_MENU: usize = 1;

pub struct SankakuAdapter {
    config: SiteConfig,
    transport: Arc<dyn Transport>,
    settings: Arc<SiteSettings>,
}

/// Builds the `tags` parameter of a keyset search.
///
/// Keywords get their inner whitespace replaced by `_`, the safety filter goes first when explicit
/// content is hidden, and every non-empty part is joined with `+`.
pub fn combine_tags(query: &SearchQuery) -> String {
    let mut parts = Vec::with_capacity(query.extra_keywords.len() + 2);
    if !query.show_explicit {
        parts.push(SAFETY_FILTER.to_string());
    }
    parts.push(underscore_tag!(query.keyword));
    parts.extend(query.extra_keywords.iter().map(|kw| underscore_tag!(kw)));
    join_tags!(parts)
}

impl SankakuAdapter {
    pub fn new(
        config: SiteConfig,
        transport: Arc<dyn Transport>,
        settings: Arc<SiteSettings>,
    ) -> Self {
        Self {
            config,
            transport,
            settings,
        }
    }

    fn access_token(&self) -> Option<String> {
        self.settings.get(ACCESS_TOKEN).filter(|t| !t.is_empty())
    }

    fn front_end(&self) -> &str {
        self.config.beta_url.as_deref().unwrap_or(&self.config.base_url)
    }

    /// Every API call carries the token captured at build time and the front-end as referer.
    fn api_request(&self, request: HttpRequest) -> HttpRequest {
        request
            .bearer(self.access_token().as_deref())
            .referer(Some(self.front_end()))
    }

    /// Builds the keyset listing request for an already combined tag string.
    pub fn page_request(&self, query: &SearchQuery, tags: &str) -> HttpRequest {
        let mut request = HttpRequest::get(format!("{}/posts/keyset", self.config.api_url))
            .query("lang", "en")
            .query("next", query.cursor.token())
            .query("limit", query.page_size.min(self.config.max_page_size))
            .query("hide_posts_in_books", "in-larger-tags")
            .query("default_threshold", 1)
            .query("tags", tags);

        if query.order == ImageOrder::Popular {
            request = request.query("order_by", "popular");
        }

        self.api_request(request)
    }

    async fn username(&self, cancel: &CancelToken) -> Result<String, ExtractorError> {
        let request = self.api_request(
            HttpRequest::get(format!("{}/users/me", self.config.api_url)).query("lang", "en"),
        );
        let json = self.transport.send_json(&request, cancel).await?;
        let me: SankakuMe = serde_json::from_value(json).unwrap_or_default();

        if me.user.name.is_empty() {
            return Err(ExtractorError::AuthRequired {
                reason: String::from("could not resolve the account name"),
            });
        }
        Ok(me.user.name)
    }

    async fn tags_for(
        &self,
        query: &SearchQuery,
        cancel: &CancelToken,
    ) -> Result<String, ExtractorError> {
        match query.menu_index {
            0 => Ok(combine_tags(query)),
            FAVORITES_MENU => {
                let favorites = format!("Fav:{}", self.username(cancel).await?);
                let safety = if query.show_explicit { "" } else { SAFETY_FILTER };
                Ok(join_tags!([safety, favorites.as_str()]))
            }
            _ => Err(ExtractorError::UnsupportedOperation),
        }
    }

    /// Maps a keyset payload into items and the token of the following page.
    pub fn map_keyset(
        &self,
        json: Value,
    ) -> Result<(Vec<ResultItem>, Option<String>), ExtractorError> {
        let Value::Object(mut root) = json else {
            return Err(ExtractorError::shape("keyset payload is not a JSON object"));
        };
        let Some(Value::Array(entries)) = root.remove("data") else {
            return Err(ExtractorError::shape("keyset payload has no data list"));
        };

        let next = match root.get("meta").and_then(|meta| meta.get("next")) {
            Some(Value::String(token)) if !token.is_empty() => Some(token.clone()),
            Some(Value::Number(token)) => Some(token.to_string()),
            _ => None,
        };

        let items = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<SankakuPost>(entry.clone()) {
                Ok(post) => Some(self.map_post(post, entry)),
                Err(e) => {
                    warn!("Skipping unreadable {} entry: {}", self.config.name, e);
                    None
                }
            })
            .collect();

        Ok((items, next))
    }

    fn map_post(&self, post: SankakuPost, raw: Value) -> ResultItem {
        let front = self.front_end().to_string();
        let detail_url = format!("{front}/post/show/{}", post.id);

        let mut item = ResultItem {
            site: self.config.name.clone(),
            id: post.id,
            width: post.width,
            height: post.height,
            uploader: post.author.name,
            uploader_id: post.author.id,
            score: post.total_score,
            fav_count: post.fav_count,
            is_favorited: post.is_favorited,
            is_explicit: ExplicitRule::NotSafe.is_explicit(&post.rating),
            rating: Rating::from_rating_str(&post.rating),
            tags: post
                .tags
                .into_iter()
                .map(|tag| tag.name_en)
                .collect(),
            date: ItemDate::parse(&post.created_at.s),
            source: post.source,
            tip: post
                .redirect_to_signup
                .then(|| String::from("This item requires a logged in account")),
            raw,
            ..ResultItem::default()
        };

        item.add_url(
            MediaVariant::Thumbnail,
            MediaUrl::new(post.preview_url, Some(front.clone()), None),
        );
        item.add_url(
            MediaVariant::Medium,
            MediaUrl::new(post.sample_url, Some(front), None),
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
impl SiteAdapter for SankakuAdapter {
    fn site(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn capabilities(&self) -> SiteCapabilities {
        SiteCapabilities::all()
    }

    fn categories(&self) -> Vec<Category> {
        vec![LATEST, Category::with_account("Favorites")]
    }

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        cancel: &CancelToken,
    ) -> Result<ResultPage, ExtractorError> {
        let tags = self.tags_for(query, cancel).await?;
        let request = self.page_request(query, &tags);

        let json = self.transport.send_json(&request, cancel).await?;
        let (items, next) = self.map_keyset(json)?;

        debug!(
            "{} keyset '{}': {} items, next {:?}",
            self.config.name,
            tags,
            items.len(),
            next
        );

        Ok(match next {
            Some(token) => ResultPage {
                items,
                next_cursor: PageCursor::Token(token),
                has_more: true,
            },
            None => ResultPage {
                items,
                next_cursor: query.cursor.clone(),
                has_more: false,
            },
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

        let request = self.api_request(
            HttpRequest::get(format!("{}/tags/autosuggestCreating", self.config.api_url))
                .query("lang", "en")
                .query("tag", partial)
                .query("target", "post")
                .query("show_meta", 1),
        );

        let json = self.transport.send_json(&request, cancel).await?;
        Ok(parse_suggestions(json, SuggestOrder::Ranked))
    }

    async fn authenticate(&self, credential: Credential) -> Result<(), ExtractorError> {
        let token = credential
            .access_token()
            .ok_or_else(|| ExtractorError::InvalidCredential {
                reason: format!("no {ACCESS_TOKEN} found"),
            })?
            .to_string();

        if let Credential::Cookies(cookies) = &credential {
            for (name, value) in cookies {
                self.transport
                    .add_cookie(&format!("{name}={value}"), self.front_end())?;
            }
        }

        self.settings.set(ACCESS_TOKEN, token);
        self.settings.persist().await?;
        info!("Logged in to {}", self.config.pretty_name);
        Ok(())
    }

    async fn logout(&self) -> Result<(), ExtractorError> {
        self.settings.remove(ACCESS_TOKEN);
        self.settings.persist().await?;
        info!("Logged out of {}", self.config.pretty_name);
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    async fn star(
        &self,
        item: &ResultItem,
        cancel: &CancelToken,
    ) -> Result<StarOutcome, ExtractorError> {
        let request = self.api_request(
            HttpRequest::post(format!("{}/posts/{}/favorite", self.config.api_url, item.id))
                .query("lang", "en"),
        );

        let json = self.transport.send_json(&request, cancel).await?;
        if !json.is_object() {
            return Err(ExtractorError::shape("favorite reply is not a JSON object"));
        }
        let reply: SankakuFavorite = serde_json::from_value(json).unwrap_or_default();

        Ok(StarOutcome {
            starred: reply.success,
            fav_count: reply.score.filter(|_| reply.success),
        })
    }
}
