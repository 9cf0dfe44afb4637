use crate::partition::TransferPlan;

/// Decide whether a recording must be fetched.
///
/// Only the final file counts as present; a leftover staging file from an
/// interrupted run never suppresses a retry.
pub fn should_transfer(plan: &TransferPlan, ignore_existing: bool) -> bool {
    // If destination doesn't exist, definitely fetch
    ignore_existing || !plan.final_path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FileDescriptor;
    use crate::partition::plan;
    use std::fs;

    fn sample(root: &std::path::Path) -> TransferPlan {
        let d = FileDescriptor::parse_line("n:/Record/20180703_183000_NF.mp4,s:1").unwrap();
        plan(&d, root)
    }

    #[test]
    fn missing_file_is_transferred() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(should_transfer(&sample(tmp.path()), false));
    }

    #[test]
    fn existing_file_is_skipped_unless_forced() {
        let tmp = tempfile::tempdir().unwrap();
        let p = sample(tmp.path());
        fs::create_dir(&p.target_directory).unwrap();
        fs::write(&p.final_path, b"video").unwrap();

        assert!(!should_transfer(&p, false));
        assert!(should_transfer(&p, true));
    }

    #[test]
    fn stray_staging_file_does_not_count() {
        let tmp = tempfile::tempdir().unwrap();
        let p = sample(tmp.path());
        fs::create_dir(&p.target_directory).unwrap();
        fs::write(&p.staging_path, b"half").unwrap();

        assert!(should_transfer(&p, false));
    }
}
