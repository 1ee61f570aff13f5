//! Atomic tar / tar.gz extraction.

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info, instrument, warn};

use super::error::ExtractError;
use super::format::{ArchiveFormat, DETECTION_WINDOW, FormatDetector, default_detectors, detect_with};

const STAGING_PREFIX: &str = ".retriever-extract-";
const BACKUP_PREFIX: &str = ".retriever-replaced-";

/// A downloaded file paired with the directory it is unpacked into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub source_path: PathBuf,
    pub dest_dir: PathBuf,
}

impl ArchiveJob {
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            dest_dir: dest_dir.into(),
        }
    }
}

/// Files and directories materialized by one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTree {
    /// Directory the tree was placed in.
    pub dest_dir: PathBuf,
    /// Format the archive was read as.
    pub format: ArchiveFormat,
    /// Distinct top-level names stored in the archive, in archive order.
    pub roots: Vec<PathBuf>,
    /// Every extracted entry, relative to `dest_dir`, in archive order.
    pub entries: Vec<PathBuf>,
}

impl ExtractedTree {
    /// The single top-level entry, when the archive has exactly one.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        match self.roots.as_slice() {
            [only] => Some(only.as_path()),
            _ => None,
        }
    }

    /// Absolute (dest-joined) paths of the top-level entries.
    pub fn root_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.roots.iter().map(|root| self.dest_dir.join(root))
    }
}

/// Detects an archive's format and unpacks it.
///
/// # Example
///
/// ```no_run
/// use retriever_core::extract::{ArchiveExtractor, ArchiveJob};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tree = ArchiveExtractor::new().extract(&ArchiveJob::new("v0.1.tar.gz", "."))?;
/// println!("extracted {:?}", tree.root());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArchiveExtractor {
    detectors: Vec<Box<dyn FormatDetector>>,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractor {
    /// Creates an extractor with the built-in detectors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detectors: default_detectors(),
        }
    }

    /// Registers an additional detector.
    #[must_use]
    pub fn with_detector(mut self, detector: impl FormatDetector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Detects the archive format of `path`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Io`] if the file cannot be read
    /// - [`ExtractError::UnsupportedFormat`] if no detector matches
    pub fn detect(&self, path: &Path) -> Result<ArchiveFormat, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::io(path, e))?;
        let mut header = Vec::with_capacity(DETECTION_WINDOW);
        file.take(DETECTION_WINDOW as u64)
            .read_to_end(&mut header)
            .map_err(|e| ExtractError::io(path, e))?;

        detect_with(&self.detectors, &header, path).ok_or_else(|| ExtractError::unsupported(path))
    }

    /// Extracts `job.source_path` into `job.dest_dir`.
    ///
    /// The archive is unpacked into a hidden staging directory first; its
    /// entries are moved into place only after every entry was written.
    /// Archive directories merge into existing ones, archive files replace
    /// same-named entries, and anything else in `dest_dir` is kept, so
    /// running the same job twice yields the same archive contents.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::UnsupportedFormat`] if the format is not recognised
    /// - [`ExtractError::Corrupt`] if the archive is corrupt or truncated
    /// - [`ExtractError::UnsafeEntry`] if an entry would escape `dest_dir`
    /// - [`ExtractError::Io`] if staging or placing entries fails
    #[instrument(skip(self), fields(source = %job.source_path.display(), dest = %job.dest_dir.display()))]
    pub fn extract(&self, job: &ArchiveJob) -> Result<ExtractedTree, ExtractError> {
        let format = self.detect(&job.source_path)?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&job.dest_dir)
            .map_err(|e| ExtractError::io(&job.dest_dir, e))?;
        debug!(staging = %staging.path().display(), "unpacking into staging directory");

        let (roots, entries) = unpack_into(&job.source_path, format, staging.path())?;
        promote_roots(staging.path(), &job.dest_dir, &roots)?;

        info!(
            format = %format,
            roots = roots.len(),
            entries = entries.len(),
            "extraction complete"
        );

        Ok(ExtractedTree {
            dest_dir: job.dest_dir.clone(),
            format,
            roots,
            entries,
        })
    }
}

/// Extracts `source_path` into `dest_dir` with the built-in detectors.
///
/// # Errors
///
/// See [`ArchiveExtractor::extract`].
pub fn extract(source_path: &Path, dest_dir: &Path) -> Result<ExtractedTree, ExtractError> {
    ArchiveExtractor::new().extract(&ArchiveJob::new(source_path, dest_dir))
}

fn open_stream(path: &Path, format: ArchiveFormat) -> Result<Box<dyn Read>, ExtractError> {
    let file = File::open(path).map_err(|e| ExtractError::io(path, e))?;
    let reader = BufReader::new(file);
    Ok(match format {
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(reader)),
        ArchiveFormat::Tar => Box::new(reader),
    })
}

type Unpacked = (Vec<PathBuf>, Vec<PathBuf>);

fn unpack_into(source: &Path, format: ArchiveFormat, staging: &Path) -> Result<Unpacked, ExtractError> {
    let mut archive = tar::Archive::new(open_stream(source, format)?);
    let mut roots: Vec<PathBuf> = Vec::new();
    let mut entries = Vec::new();

    for entry in archive
        .entries()
        .map_err(|e| ExtractError::corrupt(source, e))?
    {
        let mut entry = entry.map_err(|e| ExtractError::corrupt(source, e))?;
        let kind = entry.header().entry_type();
        if kind.is_pax_global_extensions() || kind.is_pax_local_extensions() {
            continue;
        }

        let raw = entry
            .path()
            .map_err(|e| ExtractError::corrupt(source, e))?
            .into_owned();
        let Some(relative) = normalize_entry_path(&raw) else {
            return Err(ExtractError::unsafe_entry(source, raw));
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        if !entry
            .unpack_in(staging)
            .map_err(|e| ExtractError::corrupt(source, e))?
        {
            return Err(ExtractError::unsafe_entry(source, raw));
        }

        if let Some(Component::Normal(first)) = relative.components().next() {
            let root = PathBuf::from(first);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        entries.push(relative);
    }

    Ok((roots, entries))
}

/// Strips `.` components; `None` for absolute or parent-relative paths.
fn normalize_entry_path(raw: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

/// One change made to `dest_dir` while placing staged entries.
#[derive(Debug)]
enum Placement {
    /// Nothing existed at `path`; the staged entry was moved there.
    Created(PathBuf),
    /// The entry previously at `path` was moved to `backup`.
    Replaced { path: PathBuf, backup: PathBuf },
}

/// Merges the staged roots into `dest_dir`.
///
/// Staged directories are merged into existing directories of the same
/// name; every other staged entry replaces whatever is at its path. Entries
/// already in `dest_dir` that the archive does not contain are left alone.
/// Replaced entries are parked in a backup directory until every root is in
/// place, and restored if placing fails part way.
fn promote_roots(staging: &Path, dest_dir: &Path, roots: &[PathBuf]) -> Result<(), ExtractError> {
    let backups = tempfile::Builder::new()
        .prefix(BACKUP_PREFIX)
        .tempdir_in(dest_dir)
        .map_err(|e| ExtractError::io(dest_dir, e))?;
    let mut journal: Vec<Placement> = Vec::new();
    let mut pending: Vec<PathBuf> = roots.iter().rev().cloned().collect();

    while let Some(relative) = pending.pop() {
        let from = staging.join(&relative);
        let to = dest_dir.join(&relative);
        if let Err(e) = place_entry(&from, &to, &relative, backups.path(), &mut journal, &mut pending) {
            roll_back(journal);
            return Err(ExtractError::io(&to, e));
        }
    }

    if let Err(e) = backups.close() {
        warn!(dest = %dest_dir.display(), error = %e, "could not remove replaced entries");
    }
    Ok(())
}

fn place_entry(
    from: &Path,
    to: &Path,
    relative: &Path,
    backup_dir: &Path,
    journal: &mut Vec<Placement>,
    pending: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    let staged_is_dir = fs::symlink_metadata(from)?.is_dir();
    match fs::symlink_metadata(to) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::rename(from, to)?;
            journal.push(Placement::Created(to.to_path_buf()));
        }
        Err(e) => return Err(e),
        Ok(existing) if staged_is_dir && existing.is_dir() => {
            for child in fs::read_dir(from)? {
                pending.push(relative.join(child?.file_name()));
            }
        }
        Ok(_) => {
            debug!(path = %to.display(), "replacing existing entry");
            let backup = backup_dir.join(journal.len().to_string());
            fs::rename(to, &backup)?;
            journal.push(Placement::Replaced {
                path: to.to_path_buf(),
                backup,
            });
            fs::rename(from, to)?;
        }
    }
    Ok(())
}

/// Undoes `journal` in reverse order, restoring replaced entries.
fn roll_back(journal: Vec<Placement>) {
    for placement in journal.into_iter().rev() {
        let result = match &placement {
            Placement::Created(path) => remove_existing(path),
            Placement::Replaced { path, backup } => match remove_existing(path) {
                Ok(()) => fs::rename(backup, path),
                Err(e) if e.kind() == ErrorKind::NotFound => fs::rename(backup, path),
                Err(e) => Err(e),
            },
        };
        if let Err(e) = result {
            warn!(placement = ?placement, error = %e, "could not roll back extracted entry");
        }
    }
}

fn remove_existing(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
