//! Error types for archive extraction.

use std::path::PathBuf;

use thiserror::Error;

use crate::failure::FailureKind;

/// Errors that can occur while detecting or extracting an archive.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No registered detector recognised the file.
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat {
        /// The file that was inspected.
        path: PathBuf,
    },

    /// The archive stream could not be read (corrupt or truncated).
    #[error("corrupt archive {path}: {source}")]
    Corrupt {
        /// The archive being read.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: std::io::Error,
    },

    /// An entry would be written outside the destination directory.
    #[error("archive {path} contains unsafe entry {entry}")]
    UnsafeEntry {
        /// The archive being read.
        path: PathBuf,
        /// The offending entry path as stored in the archive.
        entry: PathBuf,
    },

    /// Filesystem error while staging or placing extracted entries.
    #[error("IO error extracting to {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Creates an unsupported-format error.
    pub fn unsupported(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    /// Creates a corrupt-archive error.
    pub fn corrupt(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsafe-entry error.
    pub fn unsafe_entry(path: impl Into<PathBuf>, entry: impl Into<PathBuf>) -> Self {
        Self::UnsafeEntry {
            path: path.into(),
            entry: entry.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the failure category used by the presentation layer.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedFormat { .. } => FailureKind::UnsupportedArchiveFormat,
            Self::Corrupt { .. } | Self::UnsafeEntry { .. } | Self::Io { .. } => {
                FailureKind::Extraction
            }
        }
    }
}
