//! Thin HTTP layer shared by the site adapters and the media fetcher.
//!
//! Requests are described by plain [`HttpRequest`] values and executed by a [`Transport`]. The
//! production implementation is [`HttpTransport`], built on a `reqwest::Client` with a per-site
//! cookie jar. Every call races against a [`CancelToken`].
use std::sync::Arc;

use async_trait::async_trait;
use moeloader_common::{
    bytes::Bytes,
    cancel::CancelToken,
    log::debug,
    reqwest::{
        cookie::Jar,
        header::{AUTHORIZATION, REFERER},
        Client, RequestBuilder, Response, StatusCode, Url,
    },
    serde_json::{self, Value},
    tokio,
};

use crate::error::ExtractorError;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Description of one outgoing request.
///
/// Two requests built from the same inputs compare equal, which is what makes a retried page
/// fetch observably identical to the failed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds `Authorization: Bearer …` when a non-empty token is given.
    #[must_use]
    pub fn bearer(self, token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.is_empty() => {
                self.header(AUTHORIZATION.as_str(), format!("Bearer {token}"))
            }
            _ => self,
        }
    }

    #[must_use]
    pub fn referer(self, referer: Option<&str>) -> Self {
        match referer {
            Some(referer) if !referer.is_empty() => self.header(REFERER.as_str(), referer),
            _ => self,
        }
    }

    /// Value of a query parameter, mostly useful for assertions.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes requests for adapters and fetchers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and decodes the body as JSON.
    async fn send_json(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Value, ExtractorError>;

    /// Sends the request and returns the raw body.
    async fn get_bytes(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Bytes, ExtractorError>;

    /// Stores a `name=value` cookie for `url`, sent with every later request to that origin.
    fn add_cookie(&self, _cookie: &str, _url: &str) -> Result<(), ExtractorError> {
        Ok(())
    }
}

/// `reqwest` backed transport with a cookie jar shared by every request of one site.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    cookies: Arc<Jar>,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, ExtractorError> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_provider(cookies.clone())
            .build()?;
        Ok(Self { client, cookies })
    }

    /// Returns the used client for external use.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub(crate) fn build(&self, request: &HttpRequest) -> RequestBuilder {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        let builder = builder.query(&request.query);
        request
            .headers
            .iter()
            .fold(builder, |b, (key, value)| b.header(key.as_str(), value.as_str()))
    }

    async fn execute(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Response, ExtractorError> {
        if cancel.is_cancelled() {
            return Err(ExtractorError::Cancelled);
        }

        debug!("{:?} {} {:?}", request.method, request.url, request.query);

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ExtractorError::Cancelled),
            res = self.build(request).send() => res?,
        };

        check_status(response.status(), &request.url)?;
        Ok(response)
    }
}

fn check_status(status: StatusCode, url: &str) -> Result<(), ExtractorError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ExtractorError::AuthRequired {
            reason: format!("server returned {status}"),
        });
    }

    if !status.is_success() {
        return Err(ExtractorError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_json(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Value, ExtractorError> {
        let response = self.execute(request, cancel).await?;

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ExtractorError::Cancelled),
            body = response.text() => body?,
        };

        serde_json::from_str(&body)
            .map_err(|e| ExtractorError::shape(format!("body is not valid JSON: {e}")))
    }

    async fn get_bytes(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<Bytes, ExtractorError> {
        let response = self.execute(request, cancel).await?;

        let bytes = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ExtractorError::Cancelled),
            bytes = response.bytes() => bytes?,
        };

        debug!("Fetched {} bytes from {}", bytes.len(), request.url);
        Ok(bytes)
    }

    fn add_cookie(&self, cookie: &str, url: &str) -> Result<(), ExtractorError> {
        let url = Url::parse(url).map_err(|e| ExtractorError::InvalidCredential {
            reason: format!("invalid cookie url {url}: {e}"),
        })?;
        self.cookies.add_cookie_str(cookie, &url);
        Ok(())
    }
}
