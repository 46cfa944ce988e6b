use clap::Parser;
use std::path::PathBuf;

use crate::event::Filter;

#[derive(Parser, Debug, PartialEq, Clone)]
#[command(name = "eventwatch")]
#[command(about = "Terminal dashboard for a repository activity feed (pushes, pull requests, merges)")]
pub struct CliArgs {
    /// Events endpoint URL (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Initial action filter: PUSH, PULL_REQUEST, MERGE or all
    #[arg(long)]
    pub filter: Option<Filter>,

    /// Poll interval in seconds (overrides config)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file. The dashboard otherwise logs to eventwatch.log
    /// in the local data directory; --once logs to stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Fetch once, print the events and exit
    #[arg(long)]
    pub once: bool,
}
