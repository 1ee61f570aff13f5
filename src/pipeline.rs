//! Resolve → fetch → extract → cleanup for one request.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::cleanup::{CleanupReport, TempArtifactSet, cleanup};
use crate::download::{DownloadError, DownloadResult, HttpClient, resolve_target};
use crate::extract::{ArchiveExtractor, ArchiveJob, ExtractError, ExtractedTree};

/// What the caller asked for. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    source_url: String,
    extract: bool,
}

impl DownloadRequest {
    #[must_use]
    pub fn new(source_url: impl Into<String>, extract: bool) -> Self {
        Self {
            source_url: source_url.into(),
            extract,
        }
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    #[must_use]
    pub fn extract(&self) -> bool {
        self.extract
    }
}

/// Everything a run produced.
///
/// `extraction` is `None` when extraction was not requested. An extraction
/// failure does not undo the download: `download` is always populated.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub download: DownloadResult,
    pub extraction: Option<Result<ExtractedTree, ExtractError>>,
    pub cleanup: Option<CleanupReport>,
}

impl PipelineOutcome {
    /// True when extraction was requested and failed.
    #[must_use]
    pub fn extraction_failed(&self) -> bool {
        matches!(self.extraction, Some(Err(_)))
    }
}

/// Runs the fetch-resolve-extract pipeline.
#[derive(Debug)]
pub struct Retriever {
    client: HttpClient,
    extractor: Arc<ArchiveExtractor>,
}

impl Retriever {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            extractor: Arc::new(ArchiveExtractor::new()),
        }
    }

    /// Replaces the archive extractor (e.g. one with extra detectors).
    #[must_use]
    pub fn with_extractor(mut self, extractor: ArchiveExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Runs `request`, writing into and extracting under `work_dir`.
    ///
    /// # Errors
    ///
    /// Returns the `DownloadError` of the resolve or fetch stage. Extraction
    /// failures are reported inside [`PipelineOutcome::extraction`] and
    /// cleanup failures as notices in [`PipelineOutcome::cleanup`].
    #[instrument(skip(self, request), fields(url = %request.source_url(), extract = request.extract()))]
    pub async fn run(
        &self,
        request: &DownloadRequest,
        work_dir: &Path,
    ) -> Result<PipelineOutcome, DownloadError> {
        let target = resolve_target(request.source_url())?;
        let local_path = target.local_path_in(work_dir);
        let download = self.client.fetch(request.source_url(), &local_path).await?;

        if !request.extract() {
            return Ok(PipelineOutcome {
                download,
                extraction: None,
                cleanup: None,
            });
        }

        let job = ArchiveJob::new(&download.local_path, work_dir);
        let extractor = Arc::clone(&self.extractor);
        let dest_dir = job.dest_dir.clone();
        let span = tracing::Span::current();
        // Unpacking and cleanup are blocking filesystem work.
        let (extraction, cleanup_report) = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            extract_and_clean(&extractor, &job)
        })
        .await
        .unwrap_or_else(|e| match e.try_into_panic() {
            Ok(panic) => std::panic::resume_unwind(panic),
            Err(_) => (
                Err(ExtractError::io(
                    dest_dir,
                    std::io::Error::other("extraction task was cancelled"),
                )),
                None,
            ),
        });

        Ok(PipelineOutcome {
            download,
            extraction: Some(extraction),
            cleanup: cleanup_report,
        })
    }
}

/// Extracts `job` and, on success, removes the downloaded archive.
fn extract_and_clean(
    extractor: &ArchiveExtractor,
    job: &ArchiveJob,
) -> (Result<ExtractedTree, ExtractError>, Option<CleanupReport>) {
    let mut artifacts = TempArtifactSet::new();
    artifacts.track(&job.source_path);

    let extraction = extractor.extract(job);
    let cleanup_report = match &extraction {
        Ok(tree) => {
            info!(roots = ?tree.roots, "archive extracted");
            // An archive whose root shares the download's name replaced it.
            for root in tree.root_paths() {
                artifacts.untrack(&root);
            }
            Some(cleanup(artifacts))
        }
        Err(e) => {
            warn!(error = %e, path = %job.source_path.display(), "extraction failed; keeping download");
            None
        }
    };
    (extraction, cleanup_report)
}
