//! Staged downloads: fetch into `<name>.part`, then rename into place.
//!
//! A reader never sees a half-written recording under its final name. A
//! failed transfer leaves nothing behind and is retried by the next run
//! because the final file is still absent.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use crate::device::DeviceAddress;
use crate::error::SyncError;
use crate::fetch::Fetch;
use crate::logger::Logger;
use crate::partition::TransferPlan;

/// Result of one attempted transfer. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    Downloaded { bytes: u64 },
    Failed { remote_path: String, reason: String },
}

pub struct TransferExecutor<'a, F: Fetch> {
    fetcher: &'a F,
    device: &'a DeviceAddress,
    download_timeout: Duration,
    logger: &'a dyn Logger,
    ensured: HashSet<PathBuf>,
}

impl<'a, F: Fetch> TransferExecutor<'a, F> {
    pub fn new(
        fetcher: &'a F,
        device: &'a DeviceAddress,
        download_timeout: Duration,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            fetcher,
            device,
            download_timeout,
            logger,
            ensured: HashSet::new(),
        }
    }

    /// Make sure the date folder exists. Only the last path component is
    /// created; the root is validated before the run. Failing here is fatal
    /// since every other file of that day would fail the same way.
    pub fn ensure_partition(&mut self, plan: &TransferPlan) -> Result<(), SyncError> {
        if self.ensured.contains(&plan.target_directory) {
            return Ok(());
        }
        match fs::create_dir(&plan.target_directory) {
            Ok(()) => {
                self.logger
                    .partition_created(&plan.partition, &plan.target_directory);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && plan.target_directory.is_dir() => {}
            Err(source) => {
                return Err(SyncError::CreateDirectory {
                    path: plan.target_directory.clone(),
                    source,
                })
            }
        }
        self.ensured.insert(plan.target_directory.clone());
        Ok(())
    }

    /// Download one recording. `Err` only for fatal conditions.
    pub async fn execute(&mut self, plan: &TransferPlan) -> Result<TransferResult, SyncError> {
        self.ensure_partition(plan)?;

        let url = self.device.file_url(&plan.remote_path);
        let fetched = self
            .fetcher
            .fetch_to_file(&url, &plan.staging_path, self.download_timeout)
            .await;

        let result = match fetched {
            Ok(bytes) => match fs::rename(&plan.staging_path, &plan.final_path) {
                Ok(()) => TransferResult::Downloaded { bytes },
                Err(e) => self.discard(plan, format!("rename failed: {e}")),
            },
            Err(e) => self.discard(plan, e.to_string()),
        };
        Ok(result)
    }

    fn discard(&self, plan: &TransferPlan, mut reason: String) -> TransferResult {
        if let Err(e) = fs::remove_file(&plan.staging_path) {
            if e.kind() != ErrorKind::NotFound {
                reason = format!(
                    "{reason}; could not remove {}: {e}",
                    plan.staging_path.display()
                );
            }
        }
        TransferResult::Failed {
            remote_path: plan.remote_path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::logger::NoopLogger;
    use crate::manifest::FileDescriptor;
    use crate::partition::plan;
    use std::path::Path;

    /// Writes `body` to the destination, then optionally fails.
    struct Scripted {
        body: &'static [u8],
        fail: Option<fn() -> FetchError>,
    }

    impl Fetch for Scripted {
        async fn fetch_text(&self, _url: &str, _t: Duration) -> Result<String, FetchError> {
            unreachable!("transfers never fetch text")
        }

        async fn fetch_to_file(
            &self,
            _url: &str,
            dest: &Path,
            _t: Duration,
        ) -> Result<u64, FetchError> {
            std::fs::write(dest, self.body)?;
            match self.fail {
                Some(make) => Err(make()),
                None => Ok(self.body.len() as u64),
            }
        }
    }

    fn reset() -> FetchError {
        FetchError::Transport("connection reset".into())
    }

    fn not_found() -> FetchError {
        FetchError::Status(404)
    }

    fn sample(root: &Path) -> TransferPlan {
        let d = FileDescriptor::parse_line("n:/Record/20180703_183000_NF.mp4,s:1").unwrap();
        plan(&d, root)
    }

    fn device() -> DeviceAddress {
        DeviceAddress::parse("127.0.0.1").unwrap()
    }

    #[tokio::test]
    async fn success_promotes_staging_file() {
        let tmp = tempfile::tempdir().unwrap();
        let p = sample(tmp.path());
        let dev = device();
        let fetcher = Scripted { body: b"frames", fail: None };
        let mut exec = TransferExecutor::new(&fetcher, &dev, Duration::from_secs(1), &NoopLogger);

        let r = exec.execute(&p).await.unwrap();

        assert_eq!(r, TransferResult::Downloaded { bytes: 6 });
        assert_eq!(fs::read(&p.final_path).unwrap(), b"frames");
        assert!(!p.staging_path.exists());
    }

    #[tokio::test]
    async fn interrupted_transfer_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let p = sample(tmp.path());
        let dev = device();
        let fetcher = Scripted {
            body: b"half a vid",
            fail: Some(reset),
        };
        let mut exec = TransferExecutor::new(&fetcher, &dev, Duration::from_secs(1), &NoopLogger);

        let r = exec.execute(&p).await.unwrap();

        assert!(matches!(r, TransferResult::Failed { ref remote_path, .. }
            if remote_path == "/Record/20180703_183000_NF.mp4"));
        assert!(!p.final_path.exists());
        assert!(!p.staging_path.exists());
    }

    #[tokio::test]
    async fn failed_redownload_keeps_existing_copy() {
        let tmp = tempfile::tempdir().unwrap();
        let p = sample(tmp.path());
        fs::create_dir(&p.target_directory).unwrap();
        fs::write(&p.final_path, b"old").unwrap();
        let dev = device();
        let fetcher = Scripted {
            body: b"",
            fail: Some(not_found),
        };
        let mut exec = TransferExecutor::new(&fetcher, &dev, Duration::from_secs(1), &NoopLogger);

        let r = exec.execute(&p).await.unwrap();

        assert!(matches!(r, TransferResult::Failed { .. }));
        assert_eq!(fs::read(&p.final_path).unwrap(), b"old");
        assert!(!p.staging_path.exists());
    }

    #[test]
    fn partition_creation_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        // Root is a file, so the date folder cannot be created under it.
        let root = tmp.path().join("not-a-dir");
        fs::write(&root, b"x").unwrap();
        let p = sample(&root);
        let dev = device();
        let fetcher = Scripted { body: b"", fail: None };
        let mut exec = TransferExecutor::new(&fetcher, &dev, Duration::from_secs(1), &NoopLogger);

        let err = exec.ensure_partition(&p).unwrap_err();
        assert!(matches!(err, SyncError::CreateDirectory { .. }));
    }

    #[test]
    fn existing_partition_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let p = sample(tmp.path());
        fs::create_dir(&p.target_directory).unwrap();
        let dev = device();
        let fetcher = Scripted { body: b"", fail: None };
        let mut exec = TransferExecutor::new(&fetcher, &dev, Duration::from_secs(1), &NoopLogger);

        exec.ensure_partition(&p).unwrap();
        exec.ensure_partition(&p).unwrap();
        assert!(p.target_directory.is_dir());
    }
}
