//! Local placement of recordings: `<root>/<YYYY-MM-DD>/<file name>`.

use std::path::{Path, PathBuf};

use crate::manifest::FileDescriptor;

/// Suffix for in-flight downloads. Never produced by the camera.
pub const STAGING_SUFFIX: &str = ".part";

/// Where one recording goes on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub remote_path: String,
    pub file_name: String,
    /// Name of the date folder, e.g. `2018-07-03`.
    pub partition: String,
    pub target_directory: PathBuf,
    pub final_path: PathBuf,
    pub staging_path: PathBuf,
}

/// Derive the plan for `descriptor` under `root`. No I/O.
pub fn plan(descriptor: &FileDescriptor, root: &Path) -> TransferPlan {
    let partition = descriptor.captured_at.format("%Y-%m-%d").to_string();
    let target_directory = root.join(&partition);
    let final_path = target_directory.join(&descriptor.file_name);
    let staging_path =
        target_directory.join(format!("{}{}", descriptor.file_name, STAGING_SUFFIX));

    TransferPlan {
        remote_path: descriptor.remote_path.clone(),
        file_name: descriptor.file_name.clone(),
        partition,
        target_directory,
        final_path,
        staging_path,
    }
}
