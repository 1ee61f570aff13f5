//! Fetch engine: bounded redirect following and streaming to disk.
//!
//! This module provides the `HttpClient` struct, which drives an
//! [`HttpTransport`] through the redirect protocol and streams the final
//! response body to the resolved local path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{DEFAULT_MAX_REDIRECTS, PART_FILE_SUFFIX};
use super::error::DownloadError;
use super::filename::parse_fetchable_url;
use super::redirect::{RedirectChain, is_redirect_status};
use super::transport::{BodyStream, HttpTransport, ReqwestTransport};

/// HTTP client that follows redirects under a bound and writes one file.
///
/// # Example
///
/// ```no_run
/// use retriever_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let result = client
///     .fetch("https://example.com/archive/v0.1.tar.gz", Path::new("v0.1.tar.gz"))
///     .await?;
/// println!("{} redirects", result.redirect_chain.len() - 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    max_redirects: usize,
}

/// Outcome of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// File the body was written to.
    pub local_path: PathBuf,
    /// URL the body was actually fetched from.
    pub final_url: Url,
    /// Every URL visited, original request first, `final_url` last.
    pub redirect_chain: Vec<Url>,
    /// Bytes written to `local_path`.
    pub byte_count: u64,
}

impl DownloadResult {
    /// Number of redirects followed to reach `final_url`.
    #[must_use]
    pub fn redirect_count(&self) -> usize {
        self.redirect_chain.len().saturating_sub(1)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client over a `reqwest` transport with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    /// Creates a client over a `reqwest` transport with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the HTTP client cannot be constructed.
    pub fn new_with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::with_timeouts(connect_timeout_secs, read_timeout_secs)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Creates a client over any transport (scripted doubles in tests).
    #[must_use]
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    /// Sets the maximum number of redirects followed.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Configured redirect bound.
    #[must_use]
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Fetches `url`, following redirects, and writes the body to `local_path`.
    ///
    /// An existing file at `local_path` is replaced only once the whole body
    /// has been received; on any failure it is left untouched and no partial
    /// file remains.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL (or a `Location` target) is invalid
    /// - The request fails (network error, timeout)
    /// - Redirects exceed the bound or loop
    /// - The final status is not 2xx
    /// - Writing to disk fails
    #[must_use = "download result contains the final URL and redirect chain"]
    #[instrument(skip(self), fields(url = %url, local_path = %local_path.display()))]
    pub async fn fetch(&self, url: &str, local_path: &Path) -> Result<DownloadResult, DownloadError> {
        debug!("starting download");
        let origin = parse_fetchable_url(url)?;
        let mut chain = RedirectChain::new(origin, self.max_redirects);

        let response = loop {
            let current = chain.current().clone();
            let response = self.transport.get(&current).await?;
            if !is_redirect_status(response.status) {
                break response;
            }
            let Some(location) = response.location.as_deref() else {
                return Err(DownloadError::http_status(current.as_str(), response.status));
            };
            let next = chain.follow(location)?;
            debug!(status = response.status, from = %current, to = %next, "following redirect");
        };

        let final_url = chain.current().clone();
        if !(200..300).contains(&response.status) {
            return Err(DownloadError::http_status(final_url.as_str(), response.status));
        }

        let part_path = part_path_for(local_path)?;
        let byte_count = write_atomically(response.body, final_url.as_str(), &part_path, local_path)
            .await?;

        info!(
            path = %local_path.display(),
            final_url = %final_url,
            bytes = byte_count,
            redirects = chain.redirects(),
            "download complete"
        );

        Ok(DownloadResult {
            local_path: local_path.to_path_buf(),
            final_url,
            redirect_chain: chain.into_urls(),
            byte_count,
        })
    }
}

/// Hidden sibling `.<name>.part` used while the body is streaming.
fn part_path_for(local_path: &Path) -> Result<PathBuf, DownloadError> {
    let name = local_path.file_name().ok_or_else(|| {
        DownloadError::io(
            local_path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name"),
        )
    })?;
    let mut part_name = std::ffi::OsString::from(".");
    part_name.push(name);
    part_name.push(PART_FILE_SUFFIX);
    Ok(local_path.with_file_name(part_name))
}

/// Streams `body` into `part_path`, then renames it over `local_path`.
async fn write_atomically(
    body: BodyStream,
    url: &str,
    part_path: &Path,
    local_path: &Path,
) -> Result<u64, DownloadError> {
    let mut file = File::create(part_path)
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;

    let outcome = match stream_to_file(&mut file, body, url, part_path).await {
        Ok(bytes) => {
            drop(file);
            tokio::fs::rename(part_path, local_path)
                .await
                .map(|()| bytes)
                .map_err(|e| DownloadError::io(local_path, e))
        }
        Err(e) => {
            drop(file);
            Err(e)
        }
    };

    if outcome.is_err() {
        debug!(path = %part_path.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(part_path).await;
    }
    outcome
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    mut body: BodyStream,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = body.next().await {
        let chunk = chunk_result.map_err(|e| match e {
            DownloadError::Timeout { .. } | DownloadError::Network { .. } => e,
            other => DownloadError::network(url, other),
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
