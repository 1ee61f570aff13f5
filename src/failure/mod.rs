//! Failure classification and user-facing descriptors for pipeline errors.
//!
//! Every library error maps to a [`FailureKind`]; the CLI turns that into a
//! [`FailureDescriptor`] instead of matching on message text.

use std::fmt;

/// Category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The URL (or a redirect target) could not be parsed.
    MalformedUrl,
    /// Connection, transport or timeout failure.
    Network,
    /// The final response carried a non-success status.
    HttpStatus,
    /// The redirect chain exceeded its bound or looped.
    RedirectLimitExceeded,
    /// No detector recognised the downloaded file as an archive.
    UnsupportedArchiveFormat,
    /// The archive was corrupt, truncated or could not be materialized.
    Extraction,
    /// A local filesystem write failed.
    Io,
}

impl FailureKind {
    /// Returns the stable label used in logs and status lines.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedUrl => "malformed-url",
            Self::Network => "network",
            Self::HttpStatus => "http-status",
            Self::RedirectLimitExceeded => "redirect-limit",
            Self::UnsupportedArchiveFormat => "unsupported-archive",
            Self::Extraction => "extraction",
            Self::Io => "io",
        }
    }

    /// Returns the user-facing descriptor for this kind.
    #[must_use]
    pub fn descriptor(self) -> FailureDescriptor {
        match self {
            Self::MalformedUrl => FailureDescriptor {
                kind: self,
                what: "URL could not be parsed",
                fix: "Pass an absolute http:// or https:// URL with a host.",
            },
            Self::Network => FailureDescriptor {
                kind: self,
                what: "Network request failed",
                fix: "Check connectivity or raise --timeout, then retry.",
            },
            Self::HttpStatus => FailureDescriptor {
                kind: self,
                what: "Server refused the download",
                fix: "Verify the URL still points at an existing resource.",
            },
            Self::RedirectLimitExceeded => FailureDescriptor {
                kind: self,
                what: "Redirects did not reach a final resource",
                fix: "Raise --max-redirects or use the final URL directly.",
            },
            Self::UnsupportedArchiveFormat => FailureDescriptor {
                kind: self,
                what: "Downloaded file is not a supported archive",
                fix: "Rerun without --extract, or fetch a .tar.gz/.tar archive.",
            },
            Self::Extraction => FailureDescriptor {
                kind: self,
                what: "Archive could not be extracted",
                fix: "The archive may be truncated; download it again.",
            },
            Self::Io => FailureDescriptor {
                kind: self,
                what: "Local file could not be written",
                fix: "Check permissions and free space in the working directory.",
            },
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short explanation and suggested fix for a failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub kind: FailureKind,
    pub what: &'static str,
    pub fix: &'static str,
}
