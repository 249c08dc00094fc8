use anyhow::{Context, Result};
use clap::Parser;
use sentinel_fetch::batch::{self, BatchRequest};
use sentinel_fetch::copernicus::CredentialOverrides;
use sentinel_fetch::settings::Settings;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over -q/-v
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = match &args.settings {
        Some(path) => Settings::read(path)
            .with_context(|| format!("Unable to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    debug!(?settings, "Settings loaded");

    let credentials = CredentialOverrides::from_sources(
        CredentialOverrides::new(args.user.clone(), args.password.clone()),
        settings.credentials.clone(),
    );

    let request = BatchRequest {
        aoi: args.aoi,
        start: args.start,
        end: args.end,
        max_cloud: args.cloud,
        level: args.level,
        max_items: args.max_items,
        output_dir: args.output,
        list_only: args.list_only,
        credentials,
    };

    let summary = batch::run(&request, &settings).await?;

    if let Some(report) = summary.downloads {
        for id in &report.failed {
            warn!(product_id = %id, "Not downloaded");
        }
        info!(
            "Finished. {} of {} products downloaded successfully ({} token refreshes).",
            report.downloaded.len(),
            summary.search.products.len(),
            report.refreshes
        );
    }
    Ok(())
}
