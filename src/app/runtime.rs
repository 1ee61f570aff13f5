use anyhow::{Context, Result};
use clap::Parser;
use retriever_core::{DownloadRequest, HttpClient, Retriever};
use tracing::{debug, info};

use crate::app::{config_manager, exit_handler, terminal};
use crate::cli::Args;
use crate::{ProcessExit, output};

pub(crate) async fn run_retriever() -> Result<ProcessExit> {
    // Parse before tracing so --help works without logs.
    let args = Args::parse();
    let resolved = config_manager::resolve_config(&args)?;

    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(
        resolved.default_log_level(),
        resolved.force_cli_log_level,
        no_color,
    );
    debug!(?args, "CLI arguments parsed");
    if let Some(path) = &resolved.config_path {
        debug!(path = %path.display(), "Loaded config file");
    }
    debug!(
        max_redirects = resolved.max_redirects,
        connect_timeout_secs = resolved.connect_timeout_secs,
        read_timeout_secs = resolved.read_timeout_secs,
        verbosity = resolved.verbosity.as_str(),
        "Resolved configuration"
    );

    let client = HttpClient::new_with_timeouts(
        resolved.connect_timeout_secs,
        resolved.read_timeout_secs,
    )
    .context("Failed to build HTTP client")?
    .with_max_redirects(resolved.max_redirects);
    let work_dir = std::env::current_dir().context("Failed to read current directory")?;

    info!(url = %args.url, extract = args.extract, "Retriever starting");
    let request = DownloadRequest::new(args.url.clone(), args.extract);
    let result = Retriever::new(client).run(&request, &work_dir).await;

    match &result {
        Ok(outcome) => output::print_outcome(outcome, resolved.quiet()),
        Err(error) => output::print_failure(error.kind(), &error.to_string()),
    }
    Ok(exit_handler::determine_exit_outcome(&result))
}
