//! Fatal error types for a sync run.
//!
//! Per-file transfer failures are not errors: they are recorded in
//! [`RunOutcome`](crate::sync::RunOutcome) and the run carries on.

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Target root does not exist or is not a directory.
    #[error("--directory (-d) must be an existing directory: {path}")]
    InvalidDirectory { path: PathBuf },

    /// Target root exists but files cannot be created in it.
    #[error("--directory (-d) is not writeable: {path}: {source}")]
    DirectoryNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The --ip value is empty or not a host[:port].
    #[error("invalid device address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    /// The listing endpoint could not be reached in time.
    #[error("could not connect to dashcam at {url}, is it powered on and connected?")]
    DeviceUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The listing endpoint answered with something other than 200.
    #[error("could not get video list from dashcam: HTTP {status}")]
    ListingStatus { status: u16 },

    /// First manifest line is not a version we understand.
    #[error("invalid list version {found:?}, expecting v:1.00")]
    UnsupportedVersion { found: String },

    /// A manifest entry has no embedded YYYYMMDD_HHMMSS timestamp.
    #[error("could not parse date from filename {file_name:?}")]
    UnparseableFileName { file_name: String },

    /// A date partition could not be created under the root.
    #[error("could not create subdirectory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Process exit status for this error. Device and transport problems use 2,
    /// everything else 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::DeviceUnreachable { .. } | SyncError::ListingStatus { .. } => 2,
            _ => 1,
        }
    }

    /// True for errors raised before any network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidDirectory { .. }
                | SyncError::DirectoryNotWritable { .. }
                | SyncError::InvalidAddress { .. }
        )
    }
}
