//! CLI entry point for the retriever tool.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod output;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Download (and extraction, if requested) completed.
    Success,
    /// Download failed or configuration was invalid.
    Failure,
    /// Downloaded, but extraction failed.
    Partial,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_retriever().await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(error) => {
            eprintln!("[Error] {error:#}");
            ExitCode::from(ProcessExit::Failure.code())
        }
    }
}
