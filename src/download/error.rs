//! Error types for the download module.
//!
//! This module defines structured errors for URL resolution and fetching,
//! providing context-rich error messages for debugging and user feedback.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::failure::FailureKind;

/// Boxed transport-level cause, so scripted transports can report failures too.
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why redirect following stopped without reaching a final resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectFailure {
    /// More redirects than the configured maximum.
    Limit(usize),
    /// A URL already visited earlier in the chain came back.
    Loop,
}

impl fmt::Display for RedirectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit(max) => write!(f, "more than {max} redirects"),
            Self::Loop => f.write_str("redirect loop"),
        }
    }
}

/// Errors that can occur while resolving or downloading a URL.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying transport error.
        #[source]
        source: TransportSource,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Final response carried a non-success status (4xx, 5xx, or a 3xx without Location).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Redirect following was aborted.
    #[error("redirect limit exceeded downloading {url}: {reason} (last hop {last})")]
    RedirectLimitExceeded {
        /// The originally requested URL.
        url: String,
        /// The URL that would have been visited next.
        last: String,
        /// Bound or loop.
        reason: RedirectFailure,
    },

    /// File system error during download (create file, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from any transport error.
    pub fn network(url: impl Into<String>, source: impl Into<TransportSource>) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a redirect-limit error.
    pub fn redirect_limit(
        url: impl Into<String>,
        last: impl Into<String>,
        reason: RedirectFailure,
    ) -> Self {
        Self::RedirectLimitExceeded {
            url: url.into(),
            last: last.into(),
            reason,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns the failure category used by the presentation layer.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => FailureKind::Network,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::RedirectLimitExceeded { .. } => FailureKind::RedirectLimitExceeded,
            Self::Io { .. } => FailureKind::Io,
            Self::InvalidUrl { .. } => FailureKind::MalformedUrl,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs a
// url or path the source error does not carry.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_network_display() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = DownloadError::network("https://example.com/file.tar.gz", source);
        let msg = error.to_string();
        assert!(msg.contains("network error"), "Expected 'network error' in: {msg}");
        assert!(msg.contains("refused"), "Expected cause in: {msg}");
        assert_eq!(error.kind(), FailureKind::Network);
    }

    #[test]
    fn test_download_error_timeout_is_network_kind() {
        let error = DownloadError::timeout("https://example.com/file.pdf");
        assert!(error.to_string().contains("timeout"));
        assert_eq!(error.kind(), FailureKind::Network);
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/file.pdf"),
            "Expected URL in: {msg}"
        );
        assert_eq!(error.kind(), FailureKind::HttpStatus);
    }

    #[test]
    fn test_download_error_redirect_limit_display() {
        let error = DownloadError::redirect_limit(
            "https://example.com/a",
            "https://example.com/k",
            RedirectFailure::Limit(10),
        );
        let msg = error.to_string();
        assert!(msg.contains("more than 10 redirects"), "got: {msg}");
        assert!(msg.contains("https://example.com/k"), "got: {msg}");
        assert_eq!(error.kind(), FailureKind::RedirectLimitExceeded);
    }

    #[test]
    fn test_download_error_redirect_loop_shares_kind() {
        let error = DownloadError::redirect_limit(
            "https://example.com/a",
            "https://example.com/a",
            RedirectFailure::Loop,
        );
        assert!(error.to_string().contains("redirect loop"));
        assert_eq!(error.kind(), FailureKind::RedirectLimitExceeded);
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/test.pdf"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test.pdf"), "Expected path in: {msg}");
        assert_eq!(error.kind(), FailureKind::Io);
    }

    #[test]
    fn test_download_error_invalid_url_display() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid URL"),
            "Expected 'invalid URL' in: {msg}"
        );
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
        assert_eq!(error.kind(), FailureKind::MalformedUrl);
    }
}
