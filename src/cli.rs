//! CLI argument definitions using clap derive macros.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ingest vulnerability scan reports and query stored findings.
#[derive(Parser, Debug)]
#[command(name = "vulnscan")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// SQLite database file (overrides config)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/vulnscan/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service until Ctrl-C
    Serve {
        /// Listen address (overrides config)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },

    /// Ingest report files from a repository and print the report
    Ingest {
        /// Repository URL, e.g. https://github.com/owner/repo
        #[arg(long, value_name = "URL")]
        repo: String,

        /// Report files to ingest
        #[arg(required = true, value_name = "ITEM")]
        items: Vec<String>,
    },

    /// Print stored findings with an exact severity
    Query {
        /// Severity to match (case-sensitive)
        #[arg(long)]
        severity: String,
    },
}
