// /////////////////////////////////////////////////////////////////////////////
// Kernel Memory Bootstrap
// SPDX-License-Identifier: MIT
// /////////////////////////////////////////////////////////////////////////////

//! Command-line surface for `kernel-memory-server`: a single `serve`
//! command with flags overriding [`crate::config::ServerConfig`].

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "kernel-memory-server", about = "Long-term memory service for LLM applications")]
pub struct Cli {
    /// Path to a TOML config file; CLI flags and `KM_*` env vars take
    /// precedence over its contents.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bind host, overriding config.
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port, overriding config.
    #[arg(long)]
    pub port: Option<u16>,

    /// Root directory for ingested document artifacts, overriding config.
    #[arg(long)]
    pub storage_root: Option<PathBuf>,

    /// Run the in-process pipeline on a bounded worker pool instead of
    /// the default (CPU-count-derived) width.
    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_invocation() {
        let cli = Cli::parse_from(["kernel-memory-server"]);
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from(["kernel-memory-server", "--port", "9090", "--host", "0.0.0.0", "--verbose"]);
        assert_eq!(cli.port, Some(9090));
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert!(cli.verbose);
    }
}
