//! Pagination driver for one search.
//!
//! A [`SearchSession`] owns the [`SearchQuery`] and every page fetched for it. Pages are fetched
//! strictly one at a time: a second call while one is running is rejected with
//! [`SessionError::Busy`], never queued. A failed or cancelled fetch leaves the session exactly as
//! it was, so calling [`fetch_next_page`](SearchSession::fetch_next_page) again repeats the same
//! request.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use log::debug;
use moeloader_common::{
    cancel::CancelToken,
    item::{ResultItem, ResultPage},
    query::SearchQuery,
};
use moeloader_extractors::sites::SiteAdapter;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing fetched yet.
    Fresh,
    /// At least one page fetched and the site may have more.
    HasPage,
    /// The site reported the last page.
    Exhausted,
}

struct SessionInner {
    query: SearchQuery,
    pages: Vec<ResultPage>,
    state: SessionState,
}

pub struct SearchSession {
    adapter: Arc<dyn SiteAdapter>,
    inner: Mutex<SessionInner>,
    in_flight: AtomicBool,
}

/// Marks a fetch as running until dropped, including when the fetch future is dropped early.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SearchSession {
    pub fn new(adapter: Arc<dyn SiteAdapter>, query: SearchQuery) -> Self {
        Self {
            adapter,
            inner: Mutex::new(SessionInner {
                query,
                pages: Vec::new(),
                state: SessionState::Fresh,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches the page after the last one and appends it.
    ///
    /// The cursor only advances when the adapter call succeeds.
    pub async fn fetch_next_page(&self, cancel: &CancelToken) -> Result<ResultPage, SessionError> {
        let _guard = FlightGuard::acquire(&self.in_flight)?;

        let query = {
            let inner = self.lock();
            if inner.state == SessionState::Exhausted {
                return Err(SessionError::Exhausted);
            }
            inner.query.clone()
        };

        let page = self.adapter.fetch_page(&query, cancel).await?;
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        let mut inner = self.lock();
        inner.query.cursor = page.next_cursor.clone();
        inner.state = if page.has_more {
            SessionState::HasPage
        } else {
            SessionState::Exhausted
        };
        inner.pages.push(page.clone());

        debug!(
            "{}: page {} with {} items, state {:?}",
            self.adapter.site(),
            inner.pages.len(),
            page.items.len(),
            inner.state
        );

        Ok(page)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// The query as it will be sent next, cursor included.
    pub fn query(&self) -> SearchQuery {
        self.lock().query.clone()
    }

    pub fn pages(&self) -> Vec<ResultPage> {
        self.lock().pages.clone()
    }

    pub fn page_count(&self) -> usize {
        self.lock().pages.len()
    }

    /// Every item fetched so far, in page order.
    pub fn items(&self) -> Vec<ResultItem> {
        self.lock()
            .pages
            .iter()
            .flat_map(|page| page.items.iter().cloned())
            .collect()
    }

    pub fn has_more(&self) -> bool {
        self.state() != SessionState::Exhausted
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn adapter(&self) -> &Arc<dyn SiteAdapter> {
        &self.adapter
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use moeloader_common::{
        cancel::{CancelSource, CancelToken},
        query::{PageCursor, SearchQuery},
        serde_json::json,
    };
    use moeloader_extractors::{
        extractor_config::DEFAULT_SITES,
        prelude::{MoebooruAdapter, SankakuAdapter, SiteSettings},
        transport::mock::{MockReply, MockTransport},
    };

    use super::{SearchSession, SessionState};
    use crate::error::SessionError;

    const KONACHAN: &str = "https://konachan.net/post.json";
    const KEYSET: &str = "https://capi-v2.sankakucomplex.com/posts/keyset";

    fn konachan(mock: &Arc<MockTransport>, query: SearchQuery) -> SearchSession {
        let adapter = MoebooruAdapter::new(DEFAULT_SITES["konachan"].clone(), mock.clone());
        SearchSession::new(Arc::new(adapter), query)
    }

    fn sankaku(mock: &Arc<MockTransport>, query: SearchQuery) -> SearchSession {
        let adapter = SankakuAdapter::new(
            DEFAULT_SITES["sankaku-chan"].clone(),
            mock.clone(),
            Arc::new(SiteSettings::in_memory("sankaku-chan")),
        );
        SearchSession::new(Arc::new(adapter), query)
    }

    fn posts(ids: &[u64]) -> MockReply {
        MockReply::Json(json!(ids
            .iter()
            .map(|id| json!({"id": id, "preview_url": format!("https://t/{id}.jpg")}))
            .collect::<Vec<_>>()))
    }

    #[tokio::test]
    async fn page_numbers_advance_until_short_page() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(KONACHAN, posts(&[1, 2, 3]));
        mock.reply(KONACHAN, posts(&[4]));

        let session = konachan(&mock, SearchQuery::new("sky").page_size(3));
        assert_eq!(session.state(), SessionState::Fresh);

        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert_eq!(session.state(), SessionState::HasPage);
        assert_eq!(session.query().cursor, PageCursor::Page(2));

        let last = session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert!(!last.has_more);
        assert_eq!(session.state(), SessionState::Exhausted);
        assert!(!session.has_more());

        let ids: Vec<u64> = session.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let sent = mock.requests();
        assert_eq!(sent[0].query_value("page"), Some("1"));
        assert_eq!(sent[1].query_value("page"), Some("2"));

        let res = session.fetch_next_page(&CancelToken::never()).await;
        assert!(matches!(res, Err(SessionError::Exhausted)));
        assert_eq!(mock.requests().len(), 2);
        assert_eq!(session.page_count(), 2);
    }

    #[tokio::test]
    async fn null_next_exhausts_cursor_session() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            KEYSET,
            MockReply::Json(json!({"meta": {"next": "tok-2"}, "data": [{"id": 1}]})),
        );
        mock.reply(
            KEYSET,
            MockReply::Json(json!({"meta": {"next": null}, "data": [{"id": 2}]})),
        );

        let session = sankaku(&mock, SearchQuery::new("solo"));
        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert_eq!(session.query().cursor, PageCursor::Token("tok-2".to_string()));

        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert_eq!(session.state(), SessionState::Exhausted);
        assert_eq!(mock.requests()[1].query_value("next"), Some("tok-2"));

        let res = session.fetch_next_page(&CancelToken::never()).await;
        assert!(matches!(res, Err(SessionError::Exhausted)));
        assert!(!matches!(res, Err(SessionError::Busy)));
    }

    #[tokio::test]
    async fn failed_fetch_retries_identical_request() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(KONACHAN, posts(&[1, 2]));
        mock.reply(KONACHAN, MockReply::Status(502));
        mock.reply(KONACHAN, posts(&[3, 4]));

        let session = konachan(&mock, SearchQuery::new("sky").page_size(2));
        session.fetch_next_page(&CancelToken::never()).await.unwrap();

        let res = session.fetch_next_page(&CancelToken::never()).await;
        assert!(matches!(res, Err(SessionError::Extractor(_))));
        assert_eq!(session.state(), SessionState::HasPage);
        assert_eq!(session.query().cursor, PageCursor::Page(2));
        assert_eq!(session.page_count(), 1);

        session.fetch_next_page(&CancelToken::never()).await.unwrap();

        let sent = mock.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1], sent[2]);
        assert_eq!(session.page_count(), 2);
    }

    #[tokio::test]
    async fn failed_keyset_fetch_retries_same_token() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(
            KEYSET,
            MockReply::Json(json!({
                "meta": {"next": "b:77"},
                "data": [{"id": 1, "preview_url": "https://t/1.jpg"}]
            })),
        );
        mock.reply(KEYSET, MockReply::Status(503));
        mock.reply(
            KEYSET,
            MockReply::Json(json!({
                "meta": {"next": null},
                "data": [{"id": 2, "preview_url": "https://t/2.jpg"}]
            })),
        );

        let session = sankaku(&mock, SearchQuery::new("sky").show_explicit(true));
        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert_eq!(session.query().cursor, PageCursor::Token("b:77".into()));

        let res = session.fetch_next_page(&CancelToken::never()).await;
        assert!(matches!(res, Err(SessionError::Extractor(_))));
        assert_eq!(session.state(), SessionState::HasPage);
        assert_eq!(session.query().cursor, PageCursor::Token("b:77".into()));

        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert_eq!(session.state(), SessionState::Exhausted);

        let sent = mock.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1], sent[2]);
        assert_eq!(sent[1].query_value("next"), Some("b:77"));
        assert_eq!(sent[0].query_value("next"), Some(""));
    }

    #[tokio::test]
    async fn shape_error_keeps_session() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(KONACHAN, MockReply::Json(json!({"reason": "maintenance"})));
        mock.reply(KONACHAN, posts(&[1]));

        let session = konachan(&mock, SearchQuery::new("sky"));
        assert!(session.fetch_next_page(&CancelToken::never()).await.is_err());
        assert_eq!(session.state(), SessionState::Fresh);

        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        assert_eq!(session.items().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_fetch_is_busy_and_cancel_is_invisible() {
        let mock = Arc::new(MockTransport::new());
        mock.reply(KONACHAN, MockReply::Hang);
        mock.reply(KONACHAN, posts(&[1]));

        let session = konachan(&mock, SearchQuery::new("sky"));
        let source = CancelSource::new();
        let token = source.token();

        let (first, second) = tokio::join!(session.fetch_next_page(&token), async {
            let res = session.fetch_next_page(&CancelToken::never()).await;
            source.cancel();
            res
        });

        assert!(matches!(first, Err(SessionError::Cancelled)));
        assert!(matches!(second, Err(SessionError::Busy)));
        assert!(!session.is_busy());
        assert_eq!(session.state(), SessionState::Fresh);
        assert_eq!(session.query().cursor, PageCursor::Start);

        session.fetch_next_page(&CancelToken::never()).await.unwrap();
        let sent = mock.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }
}
