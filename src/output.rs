//! CLI output formatting.
//!
//! Every helper returns lines instead of printing so the wording can be
//! tested; `print_*` wrappers decide the stream.

use retriever_core::{
    CleanupNotice, DownloadResult, ExtractError, ExtractedTree, FailureKind, PipelineOutcome,
};

/// Status line for a completed download.
pub(crate) fn download_line(result: &DownloadResult) -> String {
    let name = result
        .local_path
        .file_name()
        .map_or_else(|| result.local_path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut line = format!(
        "Saved {name} ({} bytes) from {}",
        result.byte_count, result.final_url
    );
    match result.redirect_count() {
        0 => {}
        1 => line.push_str(" after 1 redirect"),
        n => line.push_str(&format!(" after {n} redirects")),
    }
    line
}

/// Status line for a successful extraction.
pub(crate) fn extracted_line(tree: &ExtractedTree) -> String {
    if tree.roots.is_empty() {
        return format!("Extracted empty archive into {}", tree.dest_dir.display());
    }
    let roots: Vec<String> = tree
        .roots
        .iter()
        .map(|root| root.display().to_string())
        .collect();
    format!("Extracted {}", roots.join(", "))
}

pub(crate) fn notice_line(notice: &CleanupNotice) -> String {
    format!("[Notice] {notice}")
}

/// Error headline plus suggested fix for a failure of `kind`.
pub(crate) fn failure_lines(kind: FailureKind, message: &str) -> Vec<String> {
    let descriptor = kind.descriptor();
    vec![
        format!("[Error] {}: {message}", descriptor.what),
        format!("  Fix: {}", descriptor.fix),
    ]
}

fn extraction_failure_lines(error: &ExtractError) -> Vec<String> {
    failure_lines(error.kind(), &error.to_string())
}

/// Lines for stdout. Quiet mode keeps only cleanup notices.
pub(crate) fn outcome_stdout_lines(outcome: &PipelineOutcome, quiet: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if !quiet {
        lines.push(download_line(&outcome.download));
        if let Some(Ok(tree)) = &outcome.extraction {
            lines.push(extracted_line(tree));
        }
    }
    if let Some(report) = &outcome.cleanup {
        lines.extend(report.notices.iter().map(notice_line));
    }
    lines
}

/// Lines for stderr; only a failed extraction produces any.
pub(crate) fn outcome_stderr_lines(outcome: &PipelineOutcome) -> Vec<String> {
    match &outcome.extraction {
        Some(Err(error)) => extraction_failure_lines(error),
        _ => Vec::new(),
    }
}

pub(crate) fn print_outcome(outcome: &PipelineOutcome, quiet: bool) {
    for line in outcome_stdout_lines(outcome, quiet) {
        println!("{line}");
    }
    for line in outcome_stderr_lines(outcome) {
        eprintln!("{line}");
    }
}

pub(crate) fn print_failure(kind: FailureKind, message: &str) {
    for line in failure_lines(kind, message) {
        eprintln!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use retriever_core::cleanup::ArtifactKind;
    use retriever_core::{ArchiveFormat, CleanupReport};
    use url::Url;

    use super::*;

    fn download(chain: &[&str], bytes: u64) -> DownloadResult {
        let redirect_chain: Vec<Url> = chain.iter().map(|u| Url::parse(u).unwrap()).collect();
        DownloadResult {
            local_path: PathBuf::from("/work/v0.1.tar.gz"),
            final_url: redirect_chain.last().unwrap().clone(),
            redirect_chain,
            byte_count: bytes,
        }
    }

    fn tree(roots: &[&str]) -> ExtractedTree {
        ExtractedTree {
            dest_dir: PathBuf::from("/work"),
            format: ArchiveFormat::TarGz,
            roots: roots.iter().map(PathBuf::from).collect(),
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_download_line_without_redirects() {
        let line = download_line(&download(&["http://example.com/v0.1.tar.gz"], 1234));
        assert_eq!(
            line,
            "Saved v0.1.tar.gz (1234 bytes) from http://example.com/v0.1.tar.gz"
        );
    }

    #[test]
    fn test_download_line_pluralizes_redirects() {
        let one = download_line(&download(&["http://a.example/x", "http://b.example/x"], 1));
        assert!(one.ends_with("from http://b.example/x after 1 redirect"), "{one}");

        let three = download_line(&download(
            &[
                "http://a.example/x",
                "http://b.example/x",
                "http://c.example/x",
                "http://d.example/x",
            ],
            1,
        ));
        assert!(three.ends_with("after 3 redirects"), "{three}");
    }

    #[test]
    fn test_extracted_line_lists_roots() {
        assert_eq!(extracted_line(&tree(&["PhpWget-0.1"])), "Extracted PhpWget-0.1");
        assert_eq!(extracted_line(&tree(&["a", "b"])), "Extracted a, b");
        assert_eq!(
            extracted_line(&tree(&[])),
            "Extracted empty archive into /work"
        );
    }

    #[test]
    fn test_failure_lines_use_descriptor() {
        let lines = failure_lines(FailureKind::HttpStatus, "HTTP 404 from http://e.com/x");
        assert_eq!(
            lines[0],
            "[Error] Server refused the download: HTTP 404 from http://e.com/x"
        );
        assert!(lines[1].starts_with("  Fix: "));
    }

    #[test]
    fn test_outcome_lines_success_with_notice() {
        let outcome = PipelineOutcome {
            download: download(&["http://example.com/v0.1.tar.gz"], 10),
            extraction: Some(Ok(tree(&["PhpWget-0.1"]))),
            cleanup: Some(CleanupReport {
                removed: Vec::new(),
                notices: vec![CleanupNotice {
                    path: PathBuf::from("v0.1.tar.gz"),
                    kind: ArtifactKind::File,
                    reason: "denied".to_string(),
                }],
            }),
        };

        let lines = outcome_stdout_lines(&outcome, false);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Extracted PhpWget-0.1");
        assert_eq!(
            lines[2],
            "[Notice] could not remove temporary file v0.1.tar.gz: denied"
        );
        assert!(outcome_stderr_lines(&outcome).is_empty());

        let quiet = outcome_stdout_lines(&outcome, true);
        assert_eq!(quiet, vec![lines[2].clone()]);
    }

    #[test]
    fn test_outcome_lines_extraction_failure_goes_to_stderr() {
        let outcome = PipelineOutcome {
            download: download(&["http://example.com/page"], 10),
            extraction: Some(Err(ExtractError::unsupported("/work/page"))),
            cleanup: None,
        };

        let stdout = outcome_stdout_lines(&outcome, false);
        assert_eq!(stdout.len(), 1);
        let stderr = outcome_stderr_lines(&outcome);
        assert!(
            stderr[0].starts_with("[Error] Downloaded file is not a supported archive"),
            "{stderr:?}"
        );
    }
}
