//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Fetch a URL, follow its redirects, and optionally unpack the archive it points to.
///
/// The file is saved in the current directory under the last segment of the
/// URL path (`index.html` for directory-style URLs).
#[derive(Parser, Debug, Clone)]
#[command(name = "retriever")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download (http or https)
    #[arg(short = 'u', long)]
    pub url: String,

    /// Extract the downloaded archive into the current directory and remove it afterwards
    #[arg(short = 'x', long, visible_alias = "UZ")]
    pub extract: bool,

    /// Maximum number of redirects to follow (0-50)
    #[arg(long, value_parser = clap::value_parser!(u16).range(0..=50))]
    pub max_redirects: Option<u16>,

    /// Connection timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Whole-request timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress status lines; only errors are printed
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}
