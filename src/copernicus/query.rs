use crate::error::{Error, Result};
use chrono::NaiveDate;

pub const COLLECTION: &str = "SENTINEL-2";

/// Largest `$top` the catalogue is assumed to honour.
pub const MAX_PAGE_SIZE: usize = 100;

/// Sentinel-2 processing level, as the catalogue's `productType` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Level1C,
    Level2A,
}

impl ProductType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Level1C => "S2MSI1C",
            Self::Level2A => "S2MSI2A",
        }
    }
}

/// Maps user spellings such as `l2a`, `Level-2A` or `LEVEL 1C` to a product type.
pub fn normalize_level(level: &str) -> Result<ProductType> {
    let s = level
        .trim()
        .to_uppercase()
        .replace("LEVEL-", "")
        .replace("LEVEL", "")
        .replace(' ', "");
    match s.as_str() {
        "L1C" | "1C" | "S2MSI1C" => Ok(ProductType::Level1C),
        "L2A" | "2A" | "S2MSI2A" => Ok(ProductType::Level2A),
        _ => Err(Error::UnsupportedLevel(level.to_string())),
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|source| Error::InvalidDate {
        value: value.to_string(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    geometry_wkt: String,
    start: NaiveDate,
    end: NaiveDate,
    max_cloud: f64,
    product_type: ProductType,
    max_items: usize,
}

impl SearchCriteria {
    pub fn new(
        geometry_wkt: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        max_cloud: f64,
        product_type: ProductType,
        max_items: usize,
    ) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
        if !(0.0..=100.0).contains(&max_cloud) {
            return Err(Error::InvalidCloudCover(max_cloud));
        }
        Ok(Self {
            geometry_wkt: geometry_wkt.into(),
            start,
            end,
            max_cloud,
            product_type,
            max_items,
        })
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    /// Zero means no cap.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn page_size(&self) -> usize {
        if self.max_items > 0 {
            self.max_items.min(MAX_PAGE_SIZE)
        } else {
            MAX_PAGE_SIZE
        }
    }

    pub fn start_bound(&self) -> String {
        format!("{}T00:00:00.000Z", self.start.format("%Y-%m-%d"))
    }

    pub fn end_bound(&self) -> String {
        format!("{}T23:59:59.999Z", self.end.format("%Y-%m-%d"))
    }

    /// OData `$filter` expression for these criteria.
    pub fn filter(&self) -> String {
        [
            format!("Collection/Name eq '{COLLECTION}'"),
            format!(
                "Attributes/OData.CSC.StringAttribute/any(att:att/Name eq 'productType' \
                 and att/OData.CSC.StringAttribute/Value eq '{}')",
                self.product_type.code()
            ),
            format!(
                "OData.CSC.Intersects(area=geography'SRID=4326;{}')",
                self.geometry_wkt
            ),
            format!("ContentDate/Start ge {}", self.start_bound()),
            format!("ContentDate/Start le {}", self.end_bound()),
            format!(
                "Attributes/OData.CSC.DoubleAttribute/any(att:att/Name eq 'cloudCover' \
                 and att/OData.CSC.DoubleAttribute/Value le {:.2})",
                self.max_cloud
            ),
        ]
        .join(" and ")
    }
}
