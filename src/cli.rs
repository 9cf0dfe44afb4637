//! Command-line surface

use clap::Parser;
use std::path::PathBuf;

/// Download video files from BlackVue on local network
///
/// `--ip` and `--directory` are required unless a `--config` file supplies them.
#[derive(Clone, Debug, Default, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// The IP address of the BlackVue camera on your local network (e.g. 192.168.0.5)
    #[arg(short = 'i', long)]
    pub ip: Option<String>,

    /// The path to store the video files in
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Download the video file, even if it already exists in the directory
    #[arg(long)]
    pub ignore_existing: bool,

    /// Connection timeout for the video list, in seconds [default: 5]
    #[arg(long, value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// Per-video download timeout, in seconds [default: 300]
    #[arg(long, value_name = "SECONDS")]
    pub download_timeout: Option<u64>,

    /// TOML file with defaults for any of the options above
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Append JSONL log entries to file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// List what would be downloaded without touching the directory
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show a spinner with the current download
    #[arg(short, long)]
    pub progress: bool,

    /// Also report skipped files and the list version
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit non-zero when any single video failed to download
    #[arg(long)]
    pub strict: bool,
}
