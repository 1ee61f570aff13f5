//! Archive detection and extraction.
//!
//! Detection is content-based (gzip and ustar magic) with the filename
//! extension as a fallback hint. Extraction recreates the archive's own
//! directory structure inside the destination directory; the root name is
//! whatever the archive stores, never one derived from the URL.

mod error;
mod extractor;
mod format;

pub use error::ExtractError;
pub use extractor::{ArchiveExtractor, ArchiveJob, ExtractedTree, extract};
pub use format::{
    ArchiveFormat, DETECTION_WINDOW, ExtensionDetector, FormatDetector, GzipMagicDetector,
    UstarMagicDetector, default_detectors,
};
