//! The narrow HTTP capability the sync engine needs.
//!
//! Two operations: fetch a small text body, or stream a body into a file.
//! [`HttpFetcher`] is the real implementation; tests plug in fakes.

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Why a fetch did not produce a 200 body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Retrieval capability. Every call is bounded by `timeout`, covering the
/// whole exchange including the body.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// GET `url` and return the body as text. Non-200 is [`FetchError::Status`].
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;

    /// GET `url` and stream the body into `dest` (created or truncated).
    /// Returns bytes written. On error `dest` may hold a partial body; the
    /// caller owns cleanup.
    async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<u64, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("blackvue-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, FetchError> {
        let resp = self.client.get(url).timeout(timeout).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        Ok(resp)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self.get(url, timeout).await?;
        Ok(resp.text().await?)
    }

    async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<u64, FetchError> {
        let mut resp = self.get(url, timeout).await?;

        let file = tokio::fs::File::create(dest).await?;
        let mut writer = BufWriter::with_capacity(256 * 1024, file);
        let mut total_bytes = 0u64;

        // Copy loop; the body is never held in memory as a whole
        while let Some(chunk) = resp.chunk().await? {
            writer.write_all(&chunk).await?;
            total_bytes += chunk.len() as u64;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(total_bytes)
    }
}
