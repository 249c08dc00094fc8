use crate::copernicus::{AccessToken, DownloadOutcome, ProductDownloader, TokenIssuer};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    product_id: String,
    name: Option<String>,
}

impl DownloadTask {
    pub fn new(product_id: &str, name: Option<&str>) -> Self {
        DownloadTask {
            product_id: product_id.to_string(),
            name: name.map(str::to_string),
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }
}

/// Token lifecycle for a single product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Downloading with the token the item started with.
    Initial,
    /// A fresh token has been minted for this item; no further refresh.
    Refreshed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub outcome: DownloadOutcome,
    pub refreshed: bool,
}

/// Downloads one product, minting exactly one new token and repeating the
/// whole attempt sequence if the first sequence does not succeed.
///
/// `token` is replaced in place when a refresh happens so later items use the
/// new one. Failure to mint the replacement is returned as an error.
pub async fn download_with_refresh(
    downloader: &impl ProductDownloader,
    issuer: &impl TokenIssuer,
    token: &mut AccessToken,
    product_id: &str,
) -> Result<ItemResult> {
    let mut state = RefreshState::Initial;
    loop {
        let outcome = downloader.download(product_id, token).await?;
        match (outcome, state) {
            (outcome @ DownloadOutcome::Downloaded(_), _) | (outcome, RefreshState::Refreshed) => {
                return Ok(ItemResult {
                    outcome,
                    refreshed: state == RefreshState::Refreshed,
                })
            }
            (outcome, RefreshState::Initial) => {
                warn!(product_id, ?outcome, "Refreshing access token and retrying once");
                *token = issuer.issue_token().await?;
                state = RefreshState::Refreshed;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    pub failed: Vec<String>,
    pub refreshes: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::io(path, e.into()))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::io(path, e.into()))?;
        fs::write(path, content).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    /// Runs every task in order. A failed item is recorded and the plan moves
    /// on; only token errors abort.
    pub async fn execute(
        &self,
        downloader: &impl ProductDownloader,
        issuer: &impl TokenIssuer,
        mut token: AccessToken,
    ) -> Result<DownloadReport> {
        let mut report = DownloadReport::default();
        let total = self.tasks.len();

        for (index, task) in self.tasks.iter().enumerate() {
            info!(
                product_id = %task.product_id,
                name = task.name.as_deref().unwrap_or_default(),
                "Downloading {}/{}",
                index + 1,
                total
            );
            let result =
                download_with_refresh(downloader, issuer, &mut token, &task.product_id).await?;
            if result.refreshed {
                report.refreshes += 1;
            }
            match result.outcome {
                DownloadOutcome::Downloaded(path) => report.downloaded.push(path),
                _ => {
                    warn!(product_id = %task.product_id, "Giving up on product");
                    report.failed.push(task.product_id.clone());
                }
            }
        }
        Ok(report)
    }
}
