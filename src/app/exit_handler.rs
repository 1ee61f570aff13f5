//! Maps a pipeline result to the process exit outcome.

use retriever_core::{DownloadError, PipelineOutcome};

use crate::ProcessExit;

/// Download failures are fatal; a download whose extraction failed is partial.
pub(crate) fn determine_exit_outcome(
    result: &Result<PipelineOutcome, DownloadError>,
) -> ProcessExit {
    match result {
        Err(_) => ProcessExit::Failure,
        Ok(outcome) if outcome.extraction_failed() => ProcessExit::Partial,
        Ok(_) => ProcessExit::Success,
    }
}
