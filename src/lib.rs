//! Retriever Core Library
//!
//! This library provides the fetch-resolve-extract pipeline behind the
//! `retriever` command: map a URL to a local filename, download it while
//! following redirects under a bound, and optionally unpack the result as
//! an archive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - URL-to-path resolution and the HTTP fetch engine
//! - [`extract`] - Archive format detection and atomic extraction
//! - [`cleanup`] - Best-effort removal of transient artifacts
//! - [`pipeline`] - Wires the stages together for one request
//! - [`failure`] - Stable failure categories for presentation layers

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cleanup;
pub mod download;
pub mod extract;
pub mod failure;
pub mod pipeline;
mod user_agent;

// Re-export commonly used types
pub use cleanup::{CleanupNotice, CleanupReport, TempArtifactSet, cleanup};
pub use download::{
    DEFAULT_MAX_REDIRECTS, DownloadError, DownloadResult, HttpClient, HttpTransport,
    RedirectFailure, ResolvedTarget, resolve_target,
};
pub use extract::{ArchiveExtractor, ArchiveFormat, ArchiveJob, ExtractError, ExtractedTree};
pub use failure::{FailureDescriptor, FailureKind};
pub use pipeline::{DownloadRequest, PipelineOutcome, Retriever};
