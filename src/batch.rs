//! One search-and-download run from area of interest to files on disk.
use crate::aoi::load_aoi_wkt;
use crate::copernicus::{
    normalize_level, parse_date, search_products, CredentialManager, CredentialOverrides,
    DownloadEngine, ODataCatalogue, SearchCriteria, SearchResults, TokenIssuer,
};
use crate::download_plan::{DownloadPlan, DownloadReport, DownloadTask};
use crate::error::Result;
use crate::export::{preview, save_metadata};
use crate::settings::Settings;
use std::path::PathBuf;
use tracing::{info, instrument};

const PREVIEW_ROWS: usize = 5;
pub const PLAN_FILE: &str = "download_plan.json";

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub aoi: PathBuf,
    pub start: String,
    pub end: String,
    pub max_cloud: f64,
    pub level: String,
    /// Zero means no cap.
    pub max_items: usize,
    pub output_dir: PathBuf,
    pub list_only: bool,
    /// Already merged from every source, highest precedence first.
    pub credentials: CredentialOverrides,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub search: SearchResults,
    pub metadata_path: Option<PathBuf>,
    /// `None` when nothing was downloaded on purpose (list-only or no results).
    pub downloads: Option<DownloadReport>,
}

/// Validates the request and builds the catalogue criteria. Runs before any
/// network traffic so bad input fails fast.
pub fn build_criteria(request: &BatchRequest) -> Result<SearchCriteria> {
    info!(aoi = %request.aoi.display(), "Reading area of interest");
    let wkt = load_aoi_wkt(&request.aoi)?;
    let product_type = normalize_level(&request.level)?;
    let start = parse_date(&request.start)?;
    let end = parse_date(&request.end)?;
    SearchCriteria::new(
        wkt,
        start,
        end,
        request.max_cloud,
        product_type,
        request.max_items,
    )
}

#[instrument(skip_all, fields(output = %request.output_dir.display()))]
pub async fn run(request: &BatchRequest, settings: &Settings) -> Result<BatchSummary> {
    let criteria = build_criteria(request)?;
    info!(
        product_type = criteria.product_type().code(),
        "Searching Sentinel-2 products"
    );

    let client = reqwest::Client::new();
    let catalogue = ODataCatalogue::new(client.clone(), &settings.endpoints.catalogue);
    let search = search_products(&catalogue, &criteria).await?;

    if search.products.is_empty() {
        info!("No products found for given filters");
        return Ok(BatchSummary {
            search,
            ..Default::default()
        });
    }

    let metadata_path = save_metadata(&search.products, &request.output_dir)?;
    info!(
        products = search.products.len(),
        path = %metadata_path.display(),
        "Saved product metadata"
    );
    info!("Preview of found products:\n{}", preview(&search.products, PREVIEW_ROWS));
    if search.truncated {
        info!(
            max_items = criteria.max_items(),
            "Result list was capped; the catalogue may hold more matches"
        );
    }

    if request.list_only {
        info!("List-only mode, skipping download");
        return Ok(BatchSummary {
            search,
            metadata_path: Some(metadata_path),
            downloads: None,
        });
    }

    let credentials = request.credentials.clone().resolve()?;
    let manager = CredentialManager::new(
        client.clone(),
        &settings.endpoints.identity,
        &settings.endpoints.client_id,
        credentials,
    );
    info!("Getting access token");
    let token = manager.issue_token().await?;

    let plan = DownloadPlan::new(
        search
            .products
            .iter()
            .map(|p| DownloadTask::new(&p.id, p.name.as_deref()))
            .collect(),
    );
    plan.write(request.output_dir.join(PLAN_FILE))?;

    let engine = DownloadEngine::new(client, &settings.endpoints.download, &request.output_dir)
        .with_max_attempts(settings.download.max_attempts)
        .with_retry_delay(settings.download.retry_delay());

    info!(
        count = plan.tasks().len(),
        output = %request.output_dir.display(),
        "Downloading products"
    );
    let report = plan.execute(&engine, &manager, token).await?;
    info!(
        downloaded = report.downloaded.len(),
        failed = report.failed.len(),
        "Finished downloads"
    );

    Ok(BatchSummary {
        search,
        metadata_path: Some(metadata_path),
        downloads: Some(report),
    })
}
