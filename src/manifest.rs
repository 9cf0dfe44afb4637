//! Parser for the camera's `blackvue_vod.cgi` listing.
//!
//! The listing is plain text:
//!
//! ```text
//! v:1.00
//! n:/Record/20180703_183000_NF.mp4,s:1000000
//! n:/Record/20180703_183000_NR.mp4,s:1000000
//! ```
//!
//! The first line is a version tag, every other non-empty line describes one
//! recording. Order is preserved as the device reports it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::SyncError;

/// The only listing version this parser understands.
pub const SUPPORTED_VERSION: &str = "v:1.00";

const PATH_MARKER: &str = "n:";
const SIZE_MARKER: &str = "s:";

/// One recording known to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path on the device, e.g. `/Record/20180703_183000_NF.mp4`.
    pub remote_path: String,
    /// Last segment of `remote_path`.
    pub file_name: String,
    /// Timestamp embedded in the file name, no timezone.
    pub captured_at: NaiveDateTime,
    /// The `s:` field, carried through untouched.
    pub size_hint: Option<String>,
}

impl FileDescriptor {
    /// Parse one `n:<path>,s:<size>[,...]` record.
    pub fn parse_line(line: &str) -> Result<Self, SyncError> {
        let mut fields = line.trim().split(',');
        let first = fields.next().unwrap_or_default().trim();
        let remote_path = first.strip_prefix(PATH_MARKER).unwrap_or(first).to_string();
        let size_hint = fields.next().map(|s| {
            let s = s.trim();
            s.strip_prefix(SIZE_MARKER).unwrap_or(s).to_string()
        });

        let file_name = remote_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let captured_at =
            timestamp_from_name(&file_name).ok_or_else(|| SyncError::UnparseableFileName {
                file_name: file_name.clone(),
            })?;

        Ok(Self {
            remote_path,
            file_name,
            captured_at,
            size_hint,
        })
    }
}

/// A parsed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub version: String,
    pub files: Vec<FileDescriptor>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Parse the full listing body.
///
/// Fails on an unknown version tag or on the first record whose file name
/// carries no usable timestamp; a partial manifest is never returned.
pub fn parse_manifest(raw: &str) -> Result<Manifest, SyncError> {
    let mut lines = raw.trim().lines();
    let version = lines
        .next()
        .unwrap_or_default()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string();
    if version != SUPPORTED_VERSION {
        return Err(SyncError::UnsupportedVersion { found: version });
    }

    let files = lines
        .filter(|l| !l.trim().is_empty())
        .map(FileDescriptor::parse_line)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Manifest { version, files })
}

/// Find the first `YYYYMMDD_HHMMSS` run in `name` and turn it into a timestamp.
fn timestamp_from_name(name: &str) -> Option<NaiveDateTime> {
    static STAMP_RE: OnceLock<Regex> = OnceLock::new();
    let re =
        STAMP_RE.get_or_init(|| Regex::new(r"([0-9]{8})_([0-9]{6})").expect("valid regex"));

    let caps = re.captures(name)?;
    let (date, time) = (&caps[1], &caps[2]);
    let num = |s: &str| s.parse::<u32>().ok();

    let date = NaiveDate::from_ymd_opt(
        date[..4].parse::<i32>().ok()?,
        num(&date[4..6])?,
        num(&date[6..8])?,
    )?;
    // from_hms_opt rejects second 60, unlike the %S parser
    let time = NaiveTime::from_hms_opt(
        num(&time[..2])?,
        num(&time[2..4])?,
        num(&time[4..6])?,
    )?;
    Some(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parses_records_in_device_order() {
        let raw = "v:1.00\n\
                   n:/Record/20180704_090000_NF.mp4,s:1000000\n\
                   n:/Record/20180703_183000_NR.mp4,s:2000000\n";
        let manifest = parse_manifest(raw).expect("valid manifest");

        assert_eq!(manifest.version, "v:1.00");
        assert_eq!(manifest.len(), 2);
        let first = &manifest.files[0];
        assert_eq!(first.remote_path, "/Record/20180704_090000_NF.mp4");
        assert_eq!(first.file_name, "20180704_090000_NF.mp4");
        assert_eq!(first.captured_at, ts("2018-07-04 09:00:00"));
        assert_eq!(first.size_hint.as_deref(), Some("1000000"));
        assert_eq!(manifest.files[1].file_name, "20180703_183000_NR.mp4");
    }

    #[test]
    fn tolerates_crlf_blank_lines_and_extra_fields() {
        let raw = "v:1.00\r\n\r\nn:/Record/20180703_183000_NF.mp4,s:1000000,x:1\r\n\r\n";
        let manifest = parse_manifest(raw).expect("valid manifest");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.files[0].remote_path, "/Record/20180703_183000_NF.mp4");
        assert_eq!(manifest.files[0].size_hint.as_deref(), Some("1000000"));
    }

    #[test]
    fn version_only_manifest_is_empty() {
        let manifest = parse_manifest("v:1.00\n").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = parse_manifest("v:2.00\nn:/Record/20180703_183000_NF.mp4,s:1\n").unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedVersion { found } if found == "v:2.00"));
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let manifest =
            parse_manifest("\u{feff}v:1.00\nn:/Record/20180703_183000_NF.mp4,s:1\n").unwrap();
        assert_eq!(manifest.version, "v:1.00");
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(
            parse_manifest(""),
            Err(SyncError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn one_bad_name_fails_whole_manifest() {
        let raw = "v:1.00\n\
                   n:/Record/20180703_183000_NF.mp4,s:100\n\
                   n:/Record/bad.mp4,s:100\n\
                   n:/Record/20180703_183100_NF.mp4,s:100\n";
        let err = parse_manifest(raw).unwrap_err();
        assert!(matches!(err, SyncError::UnparseableFileName { file_name } if file_name == "bad.mp4"));
    }

    #[test]
    fn timestamp_found_anywhere_in_name() {
        let d = FileDescriptor::parse_line("n:/Record/Front_20190102_030405_PF.mp4,s:5").unwrap();
        assert_eq!(d.captured_at, ts("2019-01-02 03:04:05"));
        assert_eq!(d.file_name, "Front_20190102_030405_PF.mp4");
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        assert!(FileDescriptor::parse_line("n:/Record/20181332_183000_NF.mp4,s:1").is_err());
        assert!(FileDescriptor::parse_line("n:/Record/20180703_253000_NF.mp4,s:1").is_err());
        assert!(FileDescriptor::parse_line("n:/Record/20180703_235960_NF.mp4,s:1").is_err());
        assert!(FileDescriptor::parse_line("n:/Record/20180229_120000_NF.mp4,s:1").is_err());
    }

    #[test]
    fn missing_size_field_is_none() {
        let d = FileDescriptor::parse_line("n:/Record/20180703_183000_NF.mp4").unwrap();
        assert_eq!(d.size_hint, None);
    }
}
