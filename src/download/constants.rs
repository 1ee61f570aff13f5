//! Constants for the download module (timeouts, redirect bound, naming).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default maximum number of redirects followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Local filename used when the URL path has no filename segment.
pub const DEFAULT_INDEX_FILENAME: &str = "index.html";

/// Suffix of the in-progress file written next to the final target.
pub const PART_FILE_SUFFIX: &str = ".part";
