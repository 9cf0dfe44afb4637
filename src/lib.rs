//! BlackVue Sync Library
//!
//! Mirrors recordings from a BlackVue dashcam on the local network into
//! `<root>/<YYYY-MM-DD>/` folders, downloading only what is missing.

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod logger;
pub mod manifest;
pub mod partition;
pub mod progress;
pub mod sync;
pub mod transfer;

pub use error::SyncError;
pub use sync::{run, RunOutcome, SyncOptions};
