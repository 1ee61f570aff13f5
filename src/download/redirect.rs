//! Bounded, loop-aware redirect chain.

use url::Url;

use super::error::{DownloadError, RedirectFailure};
use super::filename::ensure_fetchable;

/// Status codes that carry a `Location` to follow.
pub(crate) fn is_redirect_status(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Ordered list of URLs visited while following redirects.
///
/// The first entry is the original request and the last is the resource
/// actually fetched. The chain never holds more than `max_redirects + 1`
/// URLs and never holds the same URL twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectChain {
    urls: Vec<Url>,
    max_redirects: usize,
}

impl RedirectChain {
    /// Starts a chain at `origin`.
    #[must_use]
    pub fn new(origin: Url, max_redirects: usize) -> Self {
        Self {
            urls: vec![origin],
            max_redirects,
        }
    }

    /// URL currently being requested.
    #[must_use]
    pub fn current(&self) -> &Url {
        // The chain is created with its origin and only ever grows.
        &self.urls[self.urls.len() - 1]
    }

    /// URL the chain started from.
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.urls[0]
    }

    /// Number of redirects followed so far.
    #[must_use]
    pub fn redirects(&self) -> usize {
        self.urls.len() - 1
    }

    /// Number of URLs in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false; a chain holds at least its origin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Visited URLs in order.
    #[must_use]
    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    /// Consumes the chain, returning the visited URLs.
    #[must_use]
    pub fn into_urls(self) -> Vec<Url> {
        self.urls
    }

    /// Resolves `location` against the current URL and appends it.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if `location` does not resolve to an http(s) URL
    /// - [`DownloadError::RedirectLimitExceeded`] if the target was already visited
    ///   or following it would exceed the redirect bound
    pub fn follow(&mut self, location: &str) -> Result<&Url, DownloadError> {
        let next = resolve_location(self.current(), location)?;

        if self.urls.contains(&next) {
            return Err(DownloadError::redirect_limit(
                self.origin().as_str(),
                next.as_str(),
                RedirectFailure::Loop,
            ));
        }
        if self.redirects() >= self.max_redirects {
            return Err(DownloadError::redirect_limit(
                self.origin().as_str(),
                next.as_str(),
                RedirectFailure::Limit(self.max_redirects),
            ));
        }

        self.urls.push(next);
        Ok(self.current())
    }
}

/// Resolves a `Location` header value (absolute or relative) against `base`.
pub(crate) fn resolve_location(base: &Url, location: &str) -> Result<Url, DownloadError> {
    let resolved = base
        .join(location.trim())
        .map_err(|_| DownloadError::invalid_url(location))?;
    if ensure_fetchable(&resolved) {
        Ok(resolved)
    } else {
        Err(DownloadError::invalid_url(resolved.as_str()))
    }
}
