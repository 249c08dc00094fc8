use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const CLOUD_COVER_NAMES: [&str; 3] = [
    "cloudCover",
    "cloudcoverpercentage",
    "cloudCoverPercentage",
];

/// A product entry as returned in the `value` array of an OData search.
///
/// Only `Id` is required. The other fields are informational and read as
/// absent when the catalogue sends them with an unexpected type.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct RawProduct {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content_date: Option<ContentDate>,
    #[serde(default)]
    pub collection: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub online: Option<bool>,
    #[serde(default, deserialize_with = "lenient_size")]
    pub content_length: Option<u64>,
    #[serde(default, rename = "S3Path", deserialize_with = "lenient")]
    pub s3_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attributes: Option<Vec<Attribute>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ContentDate {
    #[serde(default, deserialize_with = "lenient")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Attribute {
    #[serde(rename = "@odata.type", default, deserialize_with = "lenient")]
    pub odata_type: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Value,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Byte counts sometimes arrive as floats or strings.
fn lenient_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let size = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(size)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub collection: Option<String>,
    pub cloud: Option<f64>,
    pub online: Option<bool>,
    pub size_bytes: Option<u64>,
    pub s3_path: Option<String>,
}

impl From<RawProduct> for ProductRecord {
    fn from(raw: RawProduct) -> Self {
        let cloud = extract_cloud_cover(raw.attributes.as_deref().unwrap_or_default());
        let ContentDate { start, end } = raw.content_date.unwrap_or_default();
        let collection = raw
            .collection
            .as_ref()
            .and_then(|c| c.get("Name"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        Self {
            id: raw.id,
            name: raw.name,
            start,
            end,
            collection,
            cloud,
            online: raw.online,
            size_bytes: raw.content_length,
            s3_path: raw.s3_path,
        }
    }
}

/// Cloud cover percentage from a product's attribute list.
///
/// Only double-typed attributes under one of the known names count. Anything
/// missing or unparseable yields `None`.
pub fn extract_cloud_cover(attributes: &[Attribute]) -> Option<f64> {
    attributes
        .iter()
        .filter(|a| {
            a.name
                .as_deref()
                .is_some_and(|n| CLOUD_COVER_NAMES.contains(&n))
        })
        .filter(|a| {
            a.odata_type
                .as_deref()
                .is_some_and(|t| t.ends_with("DoubleAttribute"))
        })
        .find_map(|a| match &a.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
}
