use anyhow::Result;
use std::path::PathBuf;

extern crate sentinel_fetch;
use sentinel_fetch::copernicus::{
    normalize_level, parse_date, search_products, ODataCatalogue, SearchCriteria,
    CATALOGUE_ODATA_URL,
};
use sentinel_fetch::{aoi, export};

/// Lists Level-2A products over `./inputs/aoi.geojson` for October 2025 and
/// writes them to `./outputs/results.csv`. No credentials needed.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let input_dir = PathBuf::from("./inputs");
    let output_dir = PathBuf::from("./outputs");

    let wkt = aoi::load_aoi_wkt(input_dir.join("aoi.geojson"))?;
    let criteria = SearchCriteria::new(
        wkt,
        parse_date("2025-10-01")?,
        parse_date("2025-10-31")?,
        20.0,
        normalize_level("L2A")?,
        4,
    )?;

    let catalogue = ODataCatalogue::new(reqwest::Client::new(), CATALOGUE_ODATA_URL);
    let results = search_products(&catalogue, &criteria).await?;

    let path = export::save_metadata(&results.products, &output_dir)?;
    tracing::info!(path = %path.display(), "Saved");
    tracing::info!("\n{}", export::preview(&results.products, 5));

    Ok(())
}
