//! Client for the Copernicus Data Space Ecosystem OData API: Sentinel-2
//! product search, password-grant tokens and product downloads.
mod auth;
mod catalogue;
mod download;
mod product;
mod query;

pub use auth::{
    AccessToken, CredentialManager, CredentialOverrides, Credentials, TokenIssuer, PASSWORD_ENV,
    USERNAME_ENV,
};
pub use catalogue::{search_products, CatalogueTransport, ODataCatalogue, SearchResults};
pub use download::{
    DownloadEngine, DownloadOutcome, ProductDownloader, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use product::{extract_cloud_cover, Attribute, ProductRecord, RawProduct};
pub use query::{normalize_level, parse_date, ProductType, SearchCriteria, MAX_PAGE_SIZE};

pub const CATALOGUE_ODATA_URL: &str = "https://catalogue.dataspace.copernicus.eu/odata/v1";
pub const DOWNLOAD_ODATA_URL: &str = "https://download.dataspace.copernicus.eu/odata/v1";
pub const AUTH_URL: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";
pub const CLIENT_ID: &str = "cdse-public";
