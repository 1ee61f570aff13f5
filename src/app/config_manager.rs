//! Configuration lifecycle: load file config, then layer CLI overrides on top.

use std::path::PathBuf;

use anyhow::Result;
use retriever_core::download::{CONNECT_TIMEOUT_SECS, DEFAULT_MAX_REDIRECTS, READ_TIMEOUT_SECS};

use crate::app_config::{FileConfig, VerbositySetting, load_default_file_config};
use crate::cli::Args;

/// Effective settings for one run. CLI > config file > built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedConfig {
    pub(crate) max_redirects: usize,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) read_timeout_secs: u64,
    pub(crate) verbosity: VerbositySetting,
    /// Set when `-v`/`-q` was given; overrides `RUST_LOG`.
    pub(crate) force_cli_log_level: bool,
    /// Config file that was read, if any.
    pub(crate) config_path: Option<PathBuf>,
}

impl ResolvedConfig {
    pub(crate) fn quiet(&self) -> bool {
        self.verbosity == VerbositySetting::Quiet
    }

    pub(crate) fn default_log_level(&self) -> &'static str {
        match self.verbosity {
            VerbositySetting::Quiet => "error",
            VerbositySetting::Default => "warn",
            VerbositySetting::Verbose => "info",
            VerbositySetting::Debug => "debug",
        }
    }
}

/// Loads the default config file and merges `args` over it.
pub(crate) fn resolve_config(args: &Args) -> Result<ResolvedConfig> {
    let loaded = load_default_file_config()?;
    let mut resolved = merge(args, loaded.config.as_ref());
    if loaded.config.is_some() {
        resolved.config_path = loaded.path;
    }
    Ok(resolved)
}

fn cli_verbosity(args: &Args) -> Option<VerbositySetting> {
    if args.quiet {
        Some(VerbositySetting::Quiet)
    } else {
        match args.verbose {
            0 => None,
            1 => Some(VerbositySetting::Verbose),
            _ => Some(VerbositySetting::Debug),
        }
    }
}

pub(crate) fn merge(args: &Args, file: Option<&FileConfig>) -> ResolvedConfig {
    let file = file.cloned().unwrap_or_default();
    let cli_verbosity = cli_verbosity(args);

    ResolvedConfig {
        max_redirects: args
            .max_redirects
            .or(file.max_redirects)
            .map_or(DEFAULT_MAX_REDIRECTS, usize::from),
        connect_timeout_secs: args
            .connect_timeout
            .or(file.connect_timeout_secs)
            .unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: args
            .timeout
            .or(file.read_timeout_secs)
            .unwrap_or(READ_TIMEOUT_SECS),
        verbosity: cli_verbosity
            .or(file.verbosity)
            .unwrap_or(VerbositySetting::Default),
        force_cli_log_level: cli_verbosity.is_some(),
        config_path: None,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["retriever", "-u", "http://example.com"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_merge_without_file_uses_defaults() {
        let resolved = merge(&args(&[]), None);
        assert_eq!(resolved.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert_eq!(resolved.connect_timeout_secs, 30);
        assert_eq!(resolved.read_timeout_secs, 300);
        assert_eq!(resolved.verbosity, VerbositySetting::Default);
        assert_eq!(resolved.default_log_level(), "warn");
        assert!(!resolved.force_cli_log_level);
        assert!(!resolved.quiet());
    }

    #[test]
    fn test_merge_file_overrides_defaults() {
        let file = FileConfig {
            max_redirects: Some(2),
            connect_timeout_secs: Some(5),
            read_timeout_secs: Some(60),
            verbosity: Some(VerbositySetting::Quiet),
        };
        let resolved = merge(&args(&[]), Some(&file));
        assert_eq!(resolved.max_redirects, 2);
        assert_eq!(resolved.connect_timeout_secs, 5);
        assert_eq!(resolved.read_timeout_secs, 60);
        assert!(resolved.quiet());
        assert!(!resolved.force_cli_log_level, "file verbosity must not override RUST_LOG");
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let file = FileConfig {
            max_redirects: Some(2),
            connect_timeout_secs: Some(5),
            read_timeout_secs: Some(60),
            verbosity: Some(VerbositySetting::Quiet),
        };
        let resolved = merge(
            &args(&[
                "--max-redirects",
                "0",
                "--connect-timeout",
                "7",
                "--timeout",
                "9",
                "-v",
            ]),
            Some(&file),
        );
        assert_eq!(resolved.max_redirects, 0);
        assert_eq!(resolved.connect_timeout_secs, 7);
        assert_eq!(resolved.read_timeout_secs, 9);
        assert_eq!(resolved.verbosity, VerbositySetting::Verbose);
        assert_eq!(resolved.default_log_level(), "info");
        assert!(resolved.force_cli_log_level);
    }

    #[test]
    fn test_cli_verbosity_levels() {
        assert_eq!(merge(&args(&["-q"]), None).default_log_level(), "error");
        assert_eq!(merge(&args(&["-vv"]), None).default_log_level(), "debug");
        assert_eq!(merge(&args(&["-vvv"]), None).default_log_level(), "debug");
    }
}
