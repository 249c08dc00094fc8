use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The area-of-interest file could not be read or is not usable GeoJSON.
    #[error("Malformed area of interest: {0}")]
    MalformedInput(String),

    #[error("Unsupported level: {0:?}. Use L1C or L2A.")]
    UnsupportedLevel(String),

    #[error("Invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Cloud cover ceiling must be between 0 and 100, got {0}")]
    InvalidCloudCover(f64),

    #[error(
        "Missing CDSE credentials. Provide --user/--password or \
         CDSE_USERNAME/CDSE_PASSWORD environment variables."
    )]
    MissingCredentials,

    #[error("Token request failed with status {status}: {body}")]
    Authentication { status: u16, body: String },

    #[error("Catalogue search failed with status {status}: {body}")]
    SearchRequest { status: u16, body: String },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Unable to parse settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("Unable to serialize settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed_response(endpoint: &str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Decode failures become `MalformedResponse`, everything else stays `Http`.
    pub fn from_body(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            let reason = std::error::Error::source(&err)
                .map(ToString::to_string)
                .unwrap_or_else(|| err.to_string());
            Self::malformed_response(endpoint, reason)
        } else {
            Self::Http(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
