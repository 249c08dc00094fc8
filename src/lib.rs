#![allow(async_fn_in_trait)]
pub mod aoi;
pub mod batch;
pub mod copernicus;
pub mod download_plan;
mod error;
pub mod export;
pub mod settings;

pub use error::{Error, Result};
