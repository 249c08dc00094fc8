use super::product::{ProductRecord, RawProduct};
use super::query::SearchCriteria;
use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// Fetches one page of catalogue results.
///
/// Implemented over HTTP by [`ODataCatalogue`]; tests substitute their own
/// paging behaviour.
pub trait CatalogueTransport {
    async fn fetch_page(&self, filter: &str, top: usize, skip: usize) -> Result<Vec<RawProduct>>;
}

#[derive(Deserialize, Debug)]
struct ProductPage {
    value: Vec<RawProduct>,
}

pub struct ODataCatalogue {
    client: reqwest::Client,
    products_url: String,
}

impl ODataCatalogue {
    pub fn new(client: reqwest::Client, catalogue_url: &str) -> Self {
        let products_url = format!("{}/Products", catalogue_url.trim_end_matches('/'));
        Self {
            client,
            products_url,
        }
    }
}

impl CatalogueTransport for ODataCatalogue {
    #[instrument(level = "debug", skip(self, filter))]
    async fn fetch_page(&self, filter: &str, top: usize, skip: usize) -> Result<Vec<RawProduct>> {
        let response = self
            .client
            .get(&self.products_url)
            .query(&[
                ("$filter", filter.to_string()),
                ("$top", top.to_string()),
                ("$skip", skip.to_string()),
                ("$expand", "Attributes".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SearchRequest {
                status: status.as_u16(),
                body,
            });
        }

        let page = response
            .json::<ProductPage>()
            .await
            .map_err(|e| Error::from_body(&self.products_url, e))?;
        Ok(page.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub products: Vec<ProductRecord>,
    pub pages_requested: usize,
    /// Set when the `max_items` cap cut the listing short while the catalogue
    /// may still hold more matches.
    pub truncated: bool,
}

/// Pages through the catalogue until one of:
///
/// 1. a page comes back empty;
/// 2. the accumulated count reaches a non-zero `max_items`, in which case the
///    list is cut to exactly `max_items` and no further page is requested;
/// 3. a page holds fewer records than the page size. This treats a short page
///    as the end of the listing, which is how the catalogue behaves but not
///    something it promises.
pub async fn search_products(
    transport: &impl CatalogueTransport,
    criteria: &SearchCriteria,
) -> Result<SearchResults> {
    let filter = criteria.filter();
    let page_size = criteria.page_size();
    let max_items = criteria.max_items();

    let mut results = SearchResults::default();
    let mut skip = 0;

    loop {
        let batch = transport.fetch_page(&filter, page_size, skip).await?;
        results.pages_requested += 1;
        debug!(skip, count = batch.len(), "Fetched catalogue page");

        if batch.is_empty() {
            break;
        }

        let batch_len = batch.len();
        results
            .products
            .extend(batch.into_iter().map(ProductRecord::from));

        if max_items > 0 && results.products.len() >= max_items {
            results.truncated = results.products.len() > max_items || batch_len >= page_size;
            results.products.truncate(max_items);
            break;
        }

        if batch_len < page_size {
            break;
        }
        skip += page_size;
    }

    info!(
        products = results.products.len(),
        pages = results.pages_requested,
        truncated = results.truncated,
        "Catalogue search complete"
    );
    Ok(results)
}
