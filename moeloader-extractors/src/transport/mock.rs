//! In-memory [`Transport`] used by tests across the workspace.
//!
//! Replies are queued per URL and handed out in order; every request is recorded so tests can
//! assert on exactly what an adapter sent.
use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use moeloader_common::{bytes::Bytes, cancel::CancelToken, serde_json::Value};

use super::{HttpRequest, Transport};
use crate::error::ExtractorError;

#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Bytes(Bytes),
    Status(u16),
    /// Waits until the request is cancelled.
    Hang,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    cookies: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for the next request to `url` (query string excluded).
    pub fn reply(&self, url: &str, reply: MockReply) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(cookie, url)` pairs stored through [`Transport::add_cookie`].
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn next_reply(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<MockReply, ExtractorError> {
        if cancel.is_cancelled() {
            return Err(ExtractorError::Cancelled);
        }

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&request.url)
            .and_then(VecDeque::pop_front);

        match reply {
            None => Err(ExtractorError::HttpStatus {
                status: 404,
                url: request.url.clone(),
            }),
            Some(MockReply::Status(status)) => Err(ExtractorError::HttpStatus {
                status,
                url: request.url.clone(),
            }),
            Some(MockReply::Hang) => {
                cancel.cancelled().await;
                Err(ExtractorError::Cancelled)
            }
            Some(reply) => Ok(reply),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_json(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Value, ExtractorError> {
        match self.next_reply(request, cancel).await? {
            MockReply::Json(value) => Ok(value),
            _ => Err(ExtractorError::shape("mock reply is not JSON")),
        }
    }

    async fn get_bytes(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Bytes, ExtractorError> {
        match self.next_reply(request, cancel).await? {
            MockReply::Bytes(bytes) => Ok(bytes),
            MockReply::Json(value) => Ok(Bytes::from(value.to_string())),
            _ => Err(ExtractorError::shape("mock reply has no body")),
        }
    }

    fn add_cookie(&self, cookie: &str, url: &str) -> Result<(), ExtractorError> {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((cookie.to_string(), url.to_string()));
        Ok(())
    }
}
