//! One-shot sync: listing -> plan -> filter -> transfer, in device order.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::device::DeviceAddress;
use crate::error::SyncError;
use crate::fetch::{Fetch, FetchError};
use crate::filter::should_transfer;
use crate::logger::Logger;
use crate::manifest::parse_manifest;
use crate::partition;
use crate::transfer::{TransferExecutor, TransferResult};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything a run needs, already validated by the caller where possible.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub device: DeviceAddress,
    pub root: PathBuf,
    pub ignore_existing: bool,
    pub connect_timeout: Duration,
    pub download_timeout: Duration,
    /// Plan and filter only; no folders are created and nothing is fetched.
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn new(device: DeviceAddress, root: impl Into<PathBuf>) -> Self {
        Self {
            device,
            root: root.into(),
            ignore_existing: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            dry_run: false,
        }
    }
}

/// Counts for a finished run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub discovered: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files a dry run would have fetched.
    pub pending: usize,
    pub bytes: u64,
    /// `remote_path: reason` for every failed transfer.
    pub failures: Vec<String>,
}

impl RunOutcome {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Per-file failures only count against the run in strict mode.
    pub fn succeeded(&self, strict: bool) -> bool {
        !(strict && self.has_failures())
    }
}

/// Check the target root exists, is a directory and accepts new files.
pub fn validate_root(root: &Path) -> Result<(), SyncError> {
    let invalid = || SyncError::InvalidDirectory {
        path: root.to_path_buf(),
    };
    let meta = fs::metadata(root).map_err(|_| invalid())?;
    if !meta.is_dir() {
        return Err(invalid());
    }

    // Permission bits lie for root and on network shares; actually try.
    tempfile::Builder::new()
        .prefix(".blackvue-sync-")
        .suffix(".probe")
        .tempfile_in(root)
        .map_err(|source| SyncError::DirectoryNotWritable {
            path: root.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Run one sync against the device.
///
/// The root is validated first, so a bad directory fails before any network
/// call whether `run` is reached from the binary or as a library.
///
/// Returns `Err` for fatal conditions only: bad root, unreachable device,
/// non-200 listing, unknown listing version, unparseable entry, or a date
/// folder that cannot be created. Nothing is downloaded unless the whole
/// listing parsed.
pub async fn run<F: Fetch>(
    options: &SyncOptions,
    fetcher: &F,
    logger: &dyn Logger,
) -> Result<RunOutcome, SyncError> {
    let start = Instant::now();
    validate_root(&options.root)?;

    let url = options.device.listing_url();
    let raw = match fetcher.fetch_text(&url, options.connect_timeout).await {
        Ok(body) => body,
        Err(FetchError::Status(status)) => return Err(SyncError::ListingStatus { status }),
        Err(source) => return Err(SyncError::DeviceUnreachable { url, source }),
    };

    let manifest = parse_manifest(&raw)?;
    logger.manifest(&manifest.version, manifest.len());

    let total = manifest.len();
    let mut outcome = RunOutcome {
        discovered: total,
        ..Default::default()
    };
    let mut executor = TransferExecutor::new(
        fetcher,
        &options.device,
        options.download_timeout,
        logger,
    );

    for (i, descriptor) in manifest.files.iter().enumerate() {
        let plan = partition::plan(descriptor, &options.root);

        if !should_transfer(&plan, options.ignore_existing) {
            outcome.skipped += 1;
            logger.skipped(&plan);
            continue;
        }
        if options.dry_run {
            outcome.pending += 1;
            logger.pending(&plan);
            continue;
        }

        logger.download_start(&plan, i + 1, total);
        match executor.execute(&plan).await? {
            TransferResult::Downloaded { bytes } => {
                outcome.downloaded += 1;
                outcome.bytes += bytes;
                logger.downloaded(&plan, bytes);
            }
            TransferResult::Failed {
                remote_path,
                reason,
            } => {
                outcome.failed += 1;
                logger.failed(&plan, &reason);
                outcome.failures.push(format!("{remote_path}: {reason}"));
            }
        }
    }

    logger.done(&outcome, start.elapsed().as_secs_f64());
    Ok(outcome)
}
