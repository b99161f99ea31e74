use std::sync::Arc;

use async_trait::async_trait;
use moeloader_common::{bytes::Bytes, cancel::CancelToken, item::MediaUrl};
use moeloader_extractors::{
    error::ExtractorError,
    transport::{HttpRequest, Transport},
};

/// Downloads the bytes behind one media URL.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &MediaUrl, cancel: &CancelToken) -> Result<Bytes, ExtractorError>;
}

/// Fetches media through a site [`Transport`], so it shares the site's cookies and user agent.
pub struct TransportFetcher {
    transport: Arc<dyn Transport>,
}

impl TransportFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl MediaFetcher for TransportFetcher {
    async fn fetch(&self, url: &MediaUrl, cancel: &CancelToken) -> Result<Bytes, ExtractorError> {
        let request = HttpRequest::get(url.url.as_str()).referer(url.referer.as_deref());
        self.transport.get_bytes(&request, cancel).await
    }
}
