use anyhow::Result;
use chrono::Utc;
use crossterm::style::Stylize;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::partition::TransferPlan;
use crate::sync::RunOutcome;

/// Structured run events. Every method defaults to doing nothing so sinks
/// only implement what they care about.
pub trait Logger: Send + Sync {
    fn manifest(&self, _version: &str, _count: usize) {}
    fn partition_created(&self, _partition: &str, _path: &Path) {}
    fn skipped(&self, _plan: &TransferPlan) {}
    fn pending(&self, _plan: &TransferPlan) {}
    fn download_start(&self, _plan: &TransferPlan, _index: usize, _total: usize) {}
    fn downloaded(&self, _plan: &TransferPlan, _bytes: u64) {}
    fn failed(&self, _plan: &TransferPlan, _reason: &str) {}
    fn done(&self, _outcome: &RunOutcome, _seconds: f64) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

/// Human-readable status lines on stdout/stderr.
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn manifest(&self, version: &str, count: usize) {
        if self.verbose {
            println!("{} List version is {}", "info".cyan(), version);
        }
        println!("{} Discovered {} videos on device", "info".cyan(), count);
    }
    fn partition_created(&self, partition: &str, _path: &Path) {
        println!("{} Created subdirectory {}", "info".cyan(), partition);
    }
    fn skipped(&self, plan: &TransferPlan) {
        if self.verbose {
            println!("{} Skipping existing {}", "info".cyan(), plan.remote_path);
        }
    }
    fn pending(&self, plan: &TransferPlan) {
        println!(
            "{} Would download {} -> {}",
            "dry-run".yellow(),
            plan.remote_path,
            plan.final_path.display()
        );
    }
    fn download_start(&self, plan: &TransferPlan, index: usize, total: usize) {
        println!(
            "{} ({}/{}) Downloading {} ...",
            "info".cyan(),
            index,
            total,
            plan.remote_path
        );
    }
    fn downloaded(&self, plan: &TransferPlan, bytes: u64) {
        println!(
            "{} Successfully downloaded {} ({:.1} MB)",
            "success".green().bold(),
            plan.remote_path,
            bytes as f64 / 1_048_576.0
        );
    }
    fn failed(&self, plan: &TransferPlan, reason: &str) {
        eprintln!(
            "{} Failed to download {}: {}",
            "error".red().bold(),
            plan.remote_path,
            reason
        );
    }
    fn done(&self, outcome: &RunOutcome, seconds: f64) {
        println!(
            "{} Done! {} downloaded, {} skipped, {} failed in {:.1}s",
            "success".green().bold(),
            outcome.downloaded,
            outcome.skipped,
            outcome.failed,
            seconds
        );
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Manifest,
    PartitionCreated,
    Skipped,
    Pending,
    DownloadStart,
    Downloaded,
    Failed,
    Done,
}

#[derive(Serialize, Debug)]
pub struct LogRecord<'a> {
    pub timestamp: String,
    pub run_id: &'a str,
    pub event: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Appends one JSON object per event to a file (`--log-file`).
pub struct JsonlLogger {
    file: Mutex<File>,
    run_id: String,
}

impl JsonlLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
            run_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn record(&self, event: EventKind) -> LogRecord<'_> {
        LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            run_id: &self.run_id,
            event,
            file_name: None,
            path: None,
            partition: None,
            bytes: None,
            message: None,
        }
    }

    fn for_plan<'a>(&'a self, event: EventKind, plan: &'a TransferPlan) -> LogRecord<'a> {
        LogRecord {
            file_name: Some(&plan.file_name),
            path: Some(plan.final_path.display().to_string()),
            partition: Some(&plan.partition),
            ..self.record(event)
        }
    }

    fn write(&self, rec: &LogRecord<'_>) {
        if let Ok(mut f) = self.file.lock() {
            if let Ok(line) = serde_json::to_string(rec) {
                let _ = writeln!(f, "{line}");
            }
        }
    }
}

impl Logger for JsonlLogger {
    fn manifest(&self, version: &str, count: usize) {
        self.write(&LogRecord {
            message: Some(format!("version={version} files={count}")),
            ..self.record(EventKind::Manifest)
        });
    }
    fn partition_created(&self, partition: &str, path: &Path) {
        self.write(&LogRecord {
            partition: Some(partition),
            path: Some(path.display().to_string()),
            ..self.record(EventKind::PartitionCreated)
        });
    }
    fn skipped(&self, plan: &TransferPlan) {
        self.write(&self.for_plan(EventKind::Skipped, plan));
    }
    fn pending(&self, plan: &TransferPlan) {
        self.write(&self.for_plan(EventKind::Pending, plan));
    }
    fn download_start(&self, plan: &TransferPlan, _index: usize, _total: usize) {
        self.write(&self.for_plan(EventKind::DownloadStart, plan));
    }
    fn downloaded(&self, plan: &TransferPlan, bytes: u64) {
        self.write(&LogRecord {
            bytes: Some(bytes),
            ..self.for_plan(EventKind::Downloaded, plan)
        });
    }
    fn failed(&self, plan: &TransferPlan, reason: &str) {
        self.write(&LogRecord {
            message: Some(reason.to_string()),
            ..self.for_plan(EventKind::Failed, plan)
        });
    }
    fn done(&self, outcome: &RunOutcome, seconds: f64) {
        self.write(&LogRecord {
            bytes: Some(outcome.bytes),
            message: Some(format!(
                "downloaded={} skipped={} failed={} pending={} seconds={seconds:.3}",
                outcome.downloaded, outcome.skipped, outcome.failed, outcome.pending
            )),
            ..self.record(EventKind::Done)
        });
    }
}

/// Fans every event out to several sinks, in order.
pub struct Tee(pub Vec<Box<dyn Logger>>);

impl Logger for Tee {
    fn manifest(&self, version: &str, count: usize) {
        self.0.iter().for_each(|l| l.manifest(version, count));
    }
    fn partition_created(&self, partition: &str, path: &Path) {
        self.0.iter().for_each(|l| l.partition_created(partition, path));
    }
    fn skipped(&self, plan: &TransferPlan) {
        self.0.iter().for_each(|l| l.skipped(plan));
    }
    fn pending(&self, plan: &TransferPlan) {
        self.0.iter().for_each(|l| l.pending(plan));
    }
    fn download_start(&self, plan: &TransferPlan, index: usize, total: usize) {
        self.0.iter().for_each(|l| l.download_start(plan, index, total));
    }
    fn downloaded(&self, plan: &TransferPlan, bytes: u64) {
        self.0.iter().for_each(|l| l.downloaded(plan, bytes));
    }
    fn failed(&self, plan: &TransferPlan, reason: &str) {
        self.0.iter().for_each(|l| l.failed(plan, reason));
    }
    fn done(&self, outcome: &RunOutcome, seconds: f64) {
        self.0.iter().for_each(|l| l.done(outcome, seconds));
    }
}
