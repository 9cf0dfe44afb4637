//! Settings resolution: command line, then an optional TOML file, then
//! built-in defaults.
//!
//! ```toml
//! ip = "192.168.0.5"
//! directory = "/srv/dashcam"
//! download_timeout = 600
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::device::DeviceAddress;
use crate::sync::{SyncOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DOWNLOAD_TIMEOUT};

/// Contents of a `--config` file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub ip: Option<String>,
    pub directory: Option<PathBuf>,
    pub ignore_existing: bool,
    pub connect_timeout: Option<u64>,
    pub download_timeout: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub strict: bool,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let cfg: FileConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(cfg)
    }
}

/// Fully resolved settings for one invocation.
#[derive(Clone, Debug)]
pub struct Settings {
    pub sync: SyncOptions,
    pub log_file: Option<PathBuf>,
    pub progress: bool,
    pub verbose: bool,
    pub strict: bool,
}

impl Settings {
    /// Load `args.config` if given and merge it under the command line.
    pub fn from_args(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(p) => FileConfig::load(p)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: &Args, file: FileConfig) -> Result<Self> {
        let ip = args
            .ip
            .clone()
            .or(file.ip)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("--ip (-i) is a required parameter"))?;
        let directory = args
            .directory
            .clone()
            .or(file.directory)
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| anyhow::anyhow!("--directory (-d) is a required parameter"))?;
        let device = DeviceAddress::parse(&ip)?;

        let connect_timeout = seconds(
            "--connect-timeout",
            args.connect_timeout.or(file.connect_timeout),
            DEFAULT_CONNECT_TIMEOUT,
        )?;
        let download_timeout = seconds(
            "--download-timeout",
            args.download_timeout.or(file.download_timeout),
            DEFAULT_DOWNLOAD_TIMEOUT,
        )?;

        let mut sync = SyncOptions::new(device, directory);
        sync.ignore_existing = args.ignore_existing || file.ignore_existing;
        sync.connect_timeout = connect_timeout;
        sync.download_timeout = download_timeout;
        sync.dry_run = args.dry_run;

        Ok(Self {
            sync,
            log_file: args.log_file.clone().or(file.log_file),
            progress: args.progress,
            verbose: args.verbose,
            strict: args.strict || file.strict,
        })
    }
}

fn seconds(flag: &str, value: Option<u64>, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(0) => anyhow::bail!("{flag} must be at least 1 second"),
        Some(s) => Ok(Duration::from_secs(s)),
    }
}
