//! URL resolution and the HTTP fetch engine.
//!
//! This module maps a source URL to a local filename, follows redirects
//! under a fixed bound and streams the final response body to disk.
//!
//! # Features
//!
//! - Pure URL-to-filename resolution (`index.html` for directory-style URLs)
//! - Manual redirect following with loop detection and a depth bound
//! - Streaming downloads written through a `.part` file, renamed on success
//! - Substitutable [`HttpTransport`] so tests never need the network
//!
//! # Example
//!
//! ```no_run
//! use retriever_core::download::{HttpClient, resolve_target};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "https://example.com/releases/v0.1.tar.gz";
//! let target = resolve_target(url)?;
//! let client = HttpClient::new()?;
//! let result = client.fetch(url, &target.local_path_in(Path::new("."))).await?;
//! println!("Downloaded {} bytes from {}", result.byte_count, result.final_url);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;
mod redirect;
mod transport;

pub use client::{DownloadResult, HttpClient};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_INDEX_FILENAME, DEFAULT_MAX_REDIRECTS, READ_TIMEOUT_SECS,
};
pub use error::{DownloadError, RedirectFailure, TransportSource};
pub use filename::{ResolvedTarget, resolve_target};
pub use redirect::RedirectChain;
pub use transport::{BodyStream, HttpTransport, ReqwestTransport, TransportResponse};

#[cfg(test)]
pub(crate) use transport::scripted;
