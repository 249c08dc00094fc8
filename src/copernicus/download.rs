use super::auth::AccessToken;
use crate::error::{Error, Result};
use futures_util::StreamExt;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded(PathBuf),
    /// The server rejected the token; retrying with the same one is pointless.
    Unauthorized,
    /// Every attempt failed for some other reason.
    Exhausted,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }
}

pub trait ProductDownloader {
    async fn download(&self, product_id: &str, token: &AccessToken) -> Result<DownloadOutcome>;
}

enum Attempt {
    Written,
    Unauthorized,
    Failed,
}

/// Streams whole products from the OData `$value` endpoint into
/// `<output_dir>/<id>.zip`.
///
/// Every attempt starts from byte zero. A failure mid-stream can leave a
/// truncated file behind until the next attempt overwrites it.
pub struct DownloadEngine {
    client: reqwest::Client,
    download_url: String,
    output_dir: PathBuf,
    max_attempts: u32,
    retry_delay: Duration,
}

impl DownloadEngine {
    pub fn new(
        client: reqwest::Client,
        download_url: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            download_url: download_url.trim_end_matches('/').to_string(),
            output_dir: output_dir.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn product_url(&self, product_id: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/Products({product_id})/$value",
            self.download_url
        ))?)
    }

    pub fn destination(&self, product_id: &str) -> PathBuf {
        self.output_dir.join(format!("{product_id}.zip"))
    }

    async fn attempt(&self, url: &Url, token: &AccessToken, dst: &Path) -> Attempt {
        let response = match self
            .client
            .get(url.clone())
            .bearer_auth(token.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Request failed");
                return Attempt::Failed;
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Download rejected");
            return Attempt::Unauthorized;
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Unexpected download status");
            return Attempt::Failed;
        }

        match write_body(response, dst).await {
            Ok(bytes) => {
                debug!(bytes, path = %dst.display(), "Body written");
                Attempt::Written
            }
            Err(e) => {
                warn!(error = %e, "Download interrupted");
                Attempt::Failed
            }
        }
    }
}

impl ProductDownloader for DownloadEngine {
    #[instrument(skip(self, token))]
    async fn download(&self, product_id: &str, token: &AccessToken) -> Result<DownloadOutcome> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| Error::io(&self.output_dir, e))?;

        let url = self.product_url(product_id)?;
        let dst = self.destination(product_id);

        for attempt in 1..=self.max_attempts {
            if attempt > 1 && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
            debug!(attempt, max_attempts = self.max_attempts, "Download attempt");
            match self.attempt(&url, token, &dst).await {
                Attempt::Written => {
                    info!(path = %dst.display(), "Downloaded");
                    return Ok(DownloadOutcome::Downloaded(dst));
                }
                Attempt::Unauthorized => return Ok(DownloadOutcome::Unauthorized),
                Attempt::Failed => {
                    warn!(attempt, max_attempts = self.max_attempts, "Attempt failed")
                }
            }
        }

        warn!("Failed to download");
        Ok(DownloadOutcome::Exhausted)
    }
}

async fn write_body(response: reqwest::Response, dst: &Path) -> anyhow::Result<u64> {
    let mut file = File::create(dst).await?;
    let mut stream = response.bytes_stream();
    let mut byte_count = 0_u64;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        file.write_all(&bytes).await?;
        byte_count += bytes.len() as u64;
    }
    file.flush().await?;
    Ok(byte_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_url_and_destination() {
        let engine = DownloadEngine::new(
            reqwest::Client::new(),
            "https://download.dataspace.copernicus.eu/odata/v1/",
            "/tmp/s2",
        );
        assert_eq!(
            engine.product_url("a1b2-c3d4").unwrap().as_str(),
            "https://download.dataspace.copernicus.eu/odata/v1/Products(a1b2-c3d4)/$value"
        );
        assert_eq!(
            engine.destination("a1b2-c3d4"),
            PathBuf::from("/tmp/s2/a1b2-c3d4.zip")
        );
    }

    #[test]
    fn test_max_attempts_is_at_least_one() {
        let engine = DownloadEngine::new(reqwest::Client::new(), "http://localhost", "/tmp")
            .with_max_attempts(0);
        assert_eq!(engine.max_attempts, 1);
    }

    #[test]
    fn test_outcome_success() {
        assert!(DownloadOutcome::Downloaded(PathBuf::from("x.zip")).is_success());
        assert!(!DownloadOutcome::Unauthorized.is_success());
        assert!(!DownloadOutcome::Exhausted.is_success());
    }
}
