//! Cargo-style progress display
//!
//! Status lines scroll above, a spinner with the current download stays at the
//! bottom. Used for `--progress`; it wraps the console sink and suspends the
//! spinner whenever a line is printed.

use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::logger::{ConsoleLogger, Logger};
use crate::partition::TransferPlan;
use crate::sync::RunOutcome;

pub struct SyncProgress {
    spinner: ProgressBar,
    console: ConsoleLogger,
}

impl SyncProgress {
    pub fn new(verbose: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Fetching video list");

        Self {
            spinner,
            console: ConsoleLogger::new(verbose),
        }
    }

    fn status(&self, stage: &str, current: usize, total: usize, detail: &str) {
        self.spinner.set_message(format!(
            "{} ({}/{}) {}",
            stage.with(Color::Green).bold(),
            current,
            total,
            detail
        ));
    }
}

impl Logger for SyncProgress {
    fn manifest(&self, version: &str, count: usize) {
        self.spinner.suspend(|| self.console.manifest(version, count));
    }
    fn partition_created(&self, partition: &str, path: &Path) {
        self.spinner
            .suspend(|| self.console.partition_created(partition, path));
    }
    fn skipped(&self, plan: &TransferPlan) {
        self.spinner.suspend(|| self.console.skipped(plan));
    }
    fn pending(&self, plan: &TransferPlan) {
        self.spinner.suspend(|| self.console.pending(plan));
    }
    fn download_start(&self, plan: &TransferPlan, index: usize, total: usize) {
        // The spinner replaces the per-file "Downloading" line.
        self.status("Downloading", index, total, &plan.file_name);
    }
    fn downloaded(&self, plan: &TransferPlan, bytes: u64) {
        self.spinner.suspend(|| self.console.downloaded(plan, bytes));
    }
    fn failed(&self, plan: &TransferPlan, reason: &str) {
        self.spinner.suspend(|| self.console.failed(plan, reason));
    }
    fn done(&self, outcome: &RunOutcome, seconds: f64) {
        self.spinner.finish_and_clear();
        self.console.done(outcome, seconds);
    }
}

impl Drop for SyncProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
