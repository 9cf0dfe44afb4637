//! blackvue-sync - download new dashcam recordings over the local network
//!
//! One shot: fetch the camera's video list, download every recording that is
//! not yet in `<directory>/<YYYY-MM-DD>/`, then exit.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;

use blackvue_sync::cli::Args;
use blackvue_sync::config::Settings;
use blackvue_sync::fetch::HttpFetcher;
use blackvue_sync::logger::{ConsoleLogger, JsonlLogger, Logger, Tee};
use blackvue_sync::progress::SyncProgress;
use blackvue_sync::{sync, SyncError};

fn main() {
    let code = match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error".red().bold(), e);
            match e.downcast_ref::<SyncError>() {
                Some(err) => {
                    if err.is_configuration() {
                        eprintln!("Nothing was downloaded. Try --help for usage.");
                    }
                    err.exit_code()
                }
                None => 1,
            }
        }
    };
    std::process::exit(code);
}

fn try_main() -> Result<i32> {
    // A staging file left behind by Ctrl-C is overwritten by the next run
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // Exit immediately with 130 (128 + SIGINT)
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    let args = Args::parse();
    let settings = Settings::from_args(&args)?;

    let logger = build_logger(&settings)?;
    let fetcher = HttpFetcher::new(settings.sync.connect_timeout)
        .context("Failed to set up HTTP client")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let outcome = rt.block_on(sync::run(&settings.sync, &fetcher, logger.as_ref()))?;

    if outcome.has_failures() {
        eprintln!(
            "{} {} video(s) failed and will be retried on the next run:",
            "warning".yellow().bold(),
            outcome.failed
        );
        for f in &outcome.failures {
            eprintln!("  {f}");
        }
    }

    Ok(if outcome.succeeded(settings.strict) { 0 } else { 1 })
}

fn build_logger(settings: &Settings) -> Result<Box<dyn Logger>> {
    let console: Box<dyn Logger> = if settings.progress {
        Box::new(SyncProgress::new(settings.verbose))
    } else {
        Box::new(ConsoleLogger::new(settings.verbose))
    };

    match &settings.log_file {
        Some(p) => {
            let file = JsonlLogger::new(p)
                .with_context(|| format!("Failed to open log file: {}", p.display()))?;
            Ok(Box::new(Tee(vec![console, Box::new(file)])))
        }
        None => Ok(console),
    }
}
