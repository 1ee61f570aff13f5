//! HTTP transport capability used by the fetch engine.
//!
//! A transport issues exactly one GET and never follows redirects itself;
//! the engine drives the redirect protocol so it can bound and record it.
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! scripted transports to stay network-free.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use tracing::trace;
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Response body as a stream of chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// One HTTP response as seen by the fetch engine.
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Location` header, if any.
    pub location: Option<String>,
    /// Declared body length, if known.
    pub content_length: Option<u64>,
    /// Body chunks; only read for the final response.
    pub body: BodyStream,
}

impl TransportResponse {
    /// Builds a response with an in-memory body.
    #[must_use]
    pub fn with_body(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            location: None,
            content_length: Some(body.len() as u64),
            body: futures_util::stream::once(async move { Ok::<_, DownloadError>(body) }).boxed(),
        }
    }

    /// Builds a body-less redirect response pointing at `location`.
    #[must_use]
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            content_length: Some(0),
            body: futures_util::stream::empty().boxed(),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("location", &self.location)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues a single GET request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends GET `url` and returns the response without following redirects.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] or [`DownloadError::Timeout`] when
    /// no response could be obtained.
    async fn get(&self, url: &Url) -> Result<TransportResponse, DownloadError>;
}

/// `reqwest`-backed transport with redirects disabled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default timeouts (30s connect, 5min read).
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .redirect(Policy::none())
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_reqwest_error(url.as_str(), e))?;

        let status = response.status().as_u16();
        trace!(url = %url, status, "response received");
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        let url_text = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_reqwest_error(&url_text, e)))
            .boxed();

        Ok(TransportResponse {
            status,
            location,
            content_length,
            body,
        })
    }
}

fn map_reqwest_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url)
    } else {
        DownloadError::network(url, error)
    }
}
