use clap::Parser;
use std::path::PathBuf;

/// Search and download Sentinel-2 products from the Copernicus Data Space
/// Ecosystem via its OData API.
#[derive(Parser, Debug)]
#[command(name = "sentinel-fetch")]
#[command(version, about)]
pub struct Args {
    /// Path to a GeoJSON file with the area of interest (may hold several polygons, WGS84)
    #[arg(long)]
    pub aoi: PathBuf,

    /// Start sensing date (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// End sensing date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub end: String,

    /// Maximum cloud cover percentage
    #[arg(long, default_value_t = 100.0)]
    pub cloud: f64,

    /// Processing level: L1C or L2A
    #[arg(long, default_value = "L2A")]
    pub level: String,

    /// Maximum number of products to process (0 for no limit)
    #[arg(long = "maxitems", default_value_t = 10)]
    pub max_items: usize,

    /// Output directory for results.csv and downloads
    #[arg(long)]
    pub output: PathBuf,

    /// Only list products and save results.csv, do not download
    #[arg(long, alias = "list_only")]
    pub list_only: bool,

    /// CDSE username (falls back to CDSE_USERNAME, then the settings file)
    #[arg(long)]
    pub user: Option<String>,

    /// CDSE password (falls back to CDSE_PASSWORD, then the settings file)
    #[arg(long)]
    pub password: Option<String>,

    /// TOML settings file with endpoints, retry settings and credentials
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
