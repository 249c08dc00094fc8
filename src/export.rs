//! `results.csv` export of catalogue search results.
use crate::copernicus::ProductRecord;
use crate::error::{Error, Result};
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "results.csv";

const COLUMNS: [&str; 9] = [
    "id",
    "name",
    "start",
    "end",
    "collection",
    "cloud",
    "online",
    "size_bytes",
    "s3_path",
];

/// Writes one row per product to `<output_dir>/results.csv`, creating the
/// directory if needed. Missing values are left empty.
pub fn save_metadata(products: &[ProductRecord], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;
    let path = output_dir.join(RESULTS_FILE);

    let mut writer = WriterBuilder::new().has_headers(false).from_path(&path)?;
    writer.write_record(COLUMNS)?;
    for product in products {
        writer.serialize(product)?;
    }
    writer.flush().map_err(|e| Error::io(&path, e))?;
    Ok(path)
}

/// Short human-readable listing of the first `limit` products.
pub fn preview(products: &[ProductRecord], limit: usize) -> String {
    products
        .iter()
        .take(limit)
        .map(|p| {
            let cloud = p
                .cloud
                .map(|c| format!("{c:.2}%"))
                .unwrap_or_else(|| "n/a".to_string());
            format!(
                "{}  {}  {}  cloud={}",
                p.id,
                p.name.as_deref().unwrap_or("-"),
                p.start.as_deref().unwrap_or("-"),
                cloud
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
