use crate::copernicus::{
    CredentialOverrides, AUTH_URL, CATALOGUE_ODATA_URL, CLIENT_ID, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_DELAY, DOWNLOAD_ODATA_URL,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Optional TOML settings file. Every table and key may be omitted.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub download: DownloadSettings,
    pub credentials: CredentialOverrides,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub catalogue: String,
    pub identity: String,
    pub download: String,
    pub client_id: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalogue: CATALOGUE_ODATA_URL.to_string(),
            identity: AUTH_URL.to_string(),
            download: DOWNLOAD_ODATA_URL.to_string(),
            client_id: CLIENT_ID.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadSettings {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY.as_secs(),
        }
    }
}

impl DownloadSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Settings {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Result<Self> {
        let settings: Self = toml::from_str(&table.to_string())?;
        Ok(settings)
    }
}
