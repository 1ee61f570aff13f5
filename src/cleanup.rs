//! Best-effort removal of transient artifacts.
//!
//! Cleanup never fails: every path that cannot be removed becomes a
//! [`CleanupNotice`] and the remaining paths are still processed.
//! Directory trees are removed depth-first with an explicit stack, so
//! archive nesting depth never grows the call stack.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Paths created transiently by one run, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TempArtifactSet {
    paths: Vec<PathBuf>,
}

impl TempArtifactSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` for removal; duplicates are ignored.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Stops tracking `path` (e.g. when a later stage took it over).
    pub fn untrack(&mut self, path: &Path) {
        self.paths.retain(|tracked| tracked != path);
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

impl IntoIterator for TempArtifactSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// What kind of artifact a notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Directory,
}

impl ArtifactKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// Non-fatal report that an artifact could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupNotice {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub reason: String,
}

impl fmt::Display for CleanupNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not remove temporary {} {}: {}",
            self.kind.as_str(),
            self.path.display(),
            self.reason
        )
    }
}

/// Result of a cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Requested paths that were fully removed.
    pub removed: Vec<PathBuf>,
    /// Everything that could not be removed.
    pub notices: Vec<CleanupNotice>,
}

impl CleanupReport {
    /// True when every requested path was removed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.notices.is_empty()
    }

    fn notice(&mut self, path: &Path, kind: ArtifactKind, error: &std::io::Error) {
        warn!(path = %path.display(), kind = kind.as_str(), error = %error, "cleanup notice");
        self.notices.push(CleanupNotice {
            path: path.to_path_buf(),
            kind,
            reason: error.to_string(),
        });
    }
}

/// Removes every path in order; directories recursively, files directly.
pub fn cleanup<I, P>(paths: I) -> CleanupReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = CleanupReport::default();
    for path in paths {
        let path = path.as_ref();
        let notices_before = report.notices.len();
        remove_tree(path, &mut report);
        if report.notices.len() == notices_before {
            debug!(path = %path.display(), "removed temporary artifact");
            report.removed.push(path.to_path_buf());
        }
    }
    report
}

enum Visit {
    Enter(PathBuf),
    Leave(PathBuf),
}

fn remove_tree(root: &Path, report: &mut CleanupReport) {
    let mut stack = vec![Visit::Enter(root.to_path_buf())];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(path) => {
                let meta = match fs::symlink_metadata(&path) {
                    Ok(meta) => meta,
                    Err(e) => {
                        report.notice(&path, ArtifactKind::File, &e);
                        continue;
                    }
                };
                if !meta.is_dir() {
                    if let Err(e) = fs::remove_file(&path) {
                        report.notice(&path, ArtifactKind::File, &e);
                    }
                    continue;
                }
                match fs::read_dir(&path) {
                    Ok(children) => {
                        stack.push(Visit::Leave(path.clone()));
                        for child in children {
                            match child {
                                Ok(entry) => stack.push(Visit::Enter(entry.path())),
                                Err(e) => report.notice(&path, ArtifactKind::Directory, &e),
                            }
                        }
                    }
                    Err(e) => report.notice(&path, ArtifactKind::Directory, &e),
                }
            }
            Visit::Leave(path) => {
                if let Err(e) = fs::remove_dir(&path) {
                    report.notice(&path, ArtifactKind::Directory, &e);
                }
            }
        }
    }
}
