//! Archive format detection.
//!
//! Content detectors look at the first bytes of the file; hint detectors
//! look at the filename and are only consulted when no content detector
//! matched. A downloaded `v0.1` from a tarball endpoint has no extension,
//! so magic bytes come first.

use std::fmt;
use std::path::Path;

/// Number of leading bytes handed to detectors (one tar header block).
pub const DETECTION_WINDOW: usize = 512;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const USTAR_MAGIC: &[u8] = b"ustar";
const USTAR_MAGIC_OFFSET: usize = 257;

/// Archive formats the extractor can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// gzip-compressed tar.
    TarGz,
    /// Uncompressed tar.
    Tar,
}

impl ArchiveFormat {
    /// Stable label for logs and status lines.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Tar => "tar",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognises an archive format from leading bytes and/or the file path.
pub trait FormatDetector: Send + Sync + fmt::Debug {
    /// Short name used in debug logs.
    fn name(&self) -> &'static str;

    /// Returns the format if this detector recognises the file.
    fn detect(&self, header: &[u8], path: &Path) -> Option<ArchiveFormat>;

    /// Hint detectors only run after every content detector declined.
    fn is_hint(&self) -> bool {
        false
    }
}

/// Detects gzip streams by their two-byte magic.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipMagicDetector;

impl FormatDetector for GzipMagicDetector {
    fn name(&self) -> &'static str {
        "gzip-magic"
    }

    fn detect(&self, header: &[u8], _path: &Path) -> Option<ArchiveFormat> {
        header.starts_with(&GZIP_MAGIC).then_some(ArchiveFormat::TarGz)
    }
}

/// Detects POSIX/GNU tar by the `ustar` magic in the first header block.
#[derive(Debug, Clone, Copy, Default)]
pub struct UstarMagicDetector;

impl FormatDetector for UstarMagicDetector {
    fn name(&self) -> &'static str {
        "ustar-magic"
    }

    fn detect(&self, header: &[u8], _path: &Path) -> Option<ArchiveFormat> {
        header
            .get(USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + USTAR_MAGIC.len())
            .is_some_and(|magic| magic == USTAR_MAGIC)
            .then_some(ArchiveFormat::Tar)
    }
}

/// Falls back to the filename extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionDetector;

impl FormatDetector for ExtensionDetector {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn detect(&self, _header: &[u8], path: &Path) -> Option<ArchiveFormat> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }

    fn is_hint(&self) -> bool {
        true
    }
}

/// Built-in detectors in priority order.
#[must_use]
pub fn default_detectors() -> Vec<Box<dyn FormatDetector>> {
    vec![
        Box::new(GzipMagicDetector),
        Box::new(UstarMagicDetector),
        Box::new(ExtensionDetector),
    ]
}

/// Runs content detectors, then hint detectors, returning the first match.
pub(crate) fn detect_with(
    detectors: &[Box<dyn FormatDetector>],
    header: &[u8],
    path: &Path,
) -> Option<ArchiveFormat> {
    let content = detectors.iter().filter(|d| !d.is_hint());
    let hints = detectors.iter().filter(|d| d.is_hint());
    content.chain(hints).find_map(|detector| {
        let format = detector.detect(header, path)?;
        tracing::debug!(detector = detector.name(), format = %format, "archive format detected");
        Some(format)
    })
}
