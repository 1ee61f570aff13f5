//! URL-to-local-path resolution for downloads.
//!
//! Resolution is a pure function of the URL string: it never touches the
//! network or the filesystem. The host is a connection target only and
//! does not take part in naming, so `http://example.com` and
//! `http://www.example.com` both land in `index.html`.

use std::path::{Component, Path, PathBuf};

use url::Url;

use super::constants::DEFAULT_INDEX_FILENAME;
use super::error::DownloadError;

/// Local file a source URL maps to, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    file_name: String,
}

impl ResolvedTarget {
    /// Bare filename, without any directory.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path of the target inside `dir`.
    #[must_use]
    pub fn local_path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }
}

/// Resolves the local filename for `source_url`.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] when the URL does not parse, is not
/// `http`/`https`, or has no host.
pub fn resolve_target(source_url: &str) -> Result<ResolvedTarget, DownloadError> {
    let url = parse_fetchable_url(source_url)?;
    Ok(ResolvedTarget {
        file_name: filename_from_url(&url),
    })
}

/// Parses `raw` and checks it has a scheme we can fetch and a host.
pub(crate) fn parse_fetchable_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw.trim()).map_err(|_| DownloadError::invalid_url(raw))?;
    ensure_fetchable(&url).then_some(url).ok_or_else(|| DownloadError::invalid_url(raw))
}

pub(crate) fn ensure_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
}

fn filename_from_url(url: &Url) -> String {
    let Some(last) = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
    else {
        return DEFAULT_INDEX_FILENAME.to_string();
    };

    let decoded = urlencoding::decode(last).map_or_else(
        |e| {
            tracing::debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.to_string()
        },
        std::borrow::Cow::into_owned,
    );
    sanitize_filename(&decoded)
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
