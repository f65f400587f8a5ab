//! Batch map imagery downloader.
//!
//! Partitions a lat/lon bounding box into a regular grid and downloads a
//! stitched map image for every grid cell:
//! - Deterministic per-cell filenames (x{col}y{row}.png)
//! - CSV ledger mapping each image to its geographic extent
//! - Per-cell fault isolation: a failed cell is logged and skipped
//! - Bounded concurrency with a per-cell timeout

mod batch;
mod config;
mod fetch;
mod ledger;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use batch::{BatchConfig, BatchRunner};
use config::Preferences;
use fetch::HttpTileFetcher;
use patch_grid::{partition, BoundingBox, GridSpec};

#[derive(Parser, Debug)]
#[command(name = "patch-downloader")]
#[command(about = "Downloads map imagery for every cell of a lat/lon grid")]
struct Args {
    /// Preferences file (created with defaults if absent)
    #[arg(long, env = "PATCH_PREFS", default_value = "preferences.json")]
    prefs: PathBuf,

    /// Southern edge of the bounding box (degrees)
    #[arg(long, default_value = "35.65601")]
    lat_min: f64,

    /// Northern edge of the bounding box (degrees)
    #[arg(long, default_value = "35.69912")]
    lat_max: f64,

    /// Western edge of the bounding box (degrees)
    #[arg(long, default_value = "139.75306")]
    lon_min: f64,

    /// Eastern edge of the bounding box (degrees)
    #[arg(long, default_value = "139.79820")]
    lon_max: f64,

    /// Grid columns (along longitude)
    #[arg(long, default_value = "50")]
    cols: u32,

    /// Grid rows (along latitude)
    #[arg(long, default_value = "50")]
    rows: u32,

    /// Maximum concurrent cell downloads
    #[arg(long, default_value = "4")]
    max_concurrent: usize,

    /// Per-cell timeout in seconds
    #[arg(long, default_value = "600")]
    cell_timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting patch downloader");

    // Configuration is loaded once and read-only from here on.
    let prefs = Preferences::load_or_init(&args.prefs)?;
    info!(dir = %prefs.dir.display(), zoom = prefs.zoom, "Saving images to output directory");

    let bbox = BoundingBox::new(args.lat_min, args.lat_max, args.lon_min, args.lon_max);
    let spec = GridSpec::new(args.cols, args.rows);
    let cells = partition(&bbox, &spec)?;

    info!(
        cols = args.cols,
        rows = args.rows,
        cells = cells.len(),
        "Partitioned bounding box"
    );

    let fetcher = Arc::new(HttpTileFetcher::new(&prefs)?);
    let runner = BatchRunner::new(
        fetcher,
        BatchConfig {
            output_dir: prefs.dir.clone(),
            cell_timeout: Duration::from_secs(args.cell_timeout_secs),
            max_concurrent: args.max_concurrent,
        },
    );

    let summary = runner.run(cells).await?;

    for (id, error) in &summary.failed {
        warn!(cell = %id, error = %error, "Cell was not acquired");
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        ledger = %summary.ledger_path.display(),
        "Patch acquisition complete"
    );

    Ok(())
}
