//! Batch acquisition over a partitioned grid.
//!
//! Cells are processed through a bounded worker pool. Each cell is an
//! independent unit of work ending in an image file and a ledger row.
//! A failing cell is logged and skipped; the batch always runs to
//! completion and the ledger is finalized even when every cell fails.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use image::ImageOutputFormat;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};

use patch_grid::Cell;

use crate::fetch::TileFetcher;
use crate::ledger::{Ledger, LedgerRow};

/// Name of the ledger file inside the output directory.
pub const LEDGER_FILENAME: &str = "patch_latlon_ranges.csv";

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory for images and the ledger, created if absent
    pub output_dir: PathBuf,
    /// Upper bound on one cell's fetch, so a stalled request cannot stall
    /// the pool
    pub cell_timeout: Duration,
    /// Maximum cells processed concurrently
    pub max_concurrent: usize,
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: Vec<(String, anyhow::Error)>,
    pub ledger_path: PathBuf,
}

/// Drives per-cell acquisition and keeps the image corpus and the ledger
/// mutually consistent.
pub struct BatchRunner {
    fetcher: Arc<dyn TileFetcher>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(fetcher: Arc<dyn TileFetcher>, config: BatchConfig) -> Self {
        Self { fetcher, config }
    }

    /// Attempt every cell and return the summary. Per-cell failures are
    /// recorded in the summary, never propagated.
    pub async fn run(&self, cells: Vec<Cell>) -> Result<RunSummary> {
        fs::create_dir_all(&self.config.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.config.output_dir.display()
                )
            })?;

        let ledger_path = self.config.output_dir.join(LEDGER_FILENAME);
        let ledger = Arc::new(Mutex::new(Ledger::create(&ledger_path).await?));

        let total = cells.len();
        let results: Vec<Result<(), (String, anyhow::Error)>> = stream::iter(cells)
            .map(|cell| {
                let ledger = ledger.clone();
                async move {
                    match self.acquire_cell(&cell, &ledger).await {
                        Ok(()) => Ok(()),
                        Err(e) => {
                            error!(cell = %cell.id, error = %e, "Cell acquisition failed");
                            Err((cell.id.clone(), e))
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        ledger.lock().await.finish().await?;

        let mut succeeded = 0;
        let mut failed = Vec::new();
        for result in results {
            match result {
                Ok(()) => succeeded += 1,
                Err(outcome) => failed.push(outcome),
            }
        }

        info!(
            total,
            succeeded,
            failed = failed.len(),
            ledger = %ledger_path.display(),
            "Batch complete"
        );

        Ok(RunSummary {
            succeeded,
            failed,
            ledger_path,
        })
    }

    /// Process one cell end to end, from fetch to ledger row.
    ///
    /// The image is written under a temporary name and renamed into place,
    /// so a partially written file can never be mistaken for a completed
    /// cell. The ledger row is appended only after the rename succeeds; if
    /// the append itself fails the image is removed again so the corpus
    /// and the ledger stay consistent.
    async fn acquire_cell(&self, cell: &Cell, ledger: &Mutex<Ledger>) -> Result<()> {
        let filename = format!("{}.png", cell.id);
        let final_path = self.config.output_dir.join(&filename);
        let temp_path = self.config.output_dir.join(format!("{filename}.partial"));

        let image = tokio::time::timeout(
            self.config.cell_timeout,
            self.fetcher.fetch_patch(&cell.extent),
        )
        .await
        .map_err(|_| {
            anyhow!(
                "Cell fetch timed out after {}s",
                self.config.cell_timeout.as_secs()
            )
        })?
        .context("Failed to fetch cell imagery")?;

        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageOutputFormat::Png)
            .context("Failed to encode image as PNG")?;

        if let Err(e) = fs::write(&temp_path, &encoded).await {
            fs::remove_file(&temp_path).await.ok();
            return Err(e)
                .with_context(|| format!("Failed to write image: {}", temp_path.display()));
        }
        fs::rename(&temp_path, &final_path)
            .await
            .with_context(|| format!("Failed to move image into place: {}", final_path.display()))?;

        let row = LedgerRow {
            filename: filename.clone(),
            lat_min: cell.extent.lat_bottom,
            lat_max: cell.extent.lat_top,
            lon_min: cell.extent.lon_left,
            lon_max: cell.extent.lon_right,
        };

        if let Err(e) = ledger.lock().await.append(&row).await {
            fs::remove_file(&final_path).await.ok();
            return Err(e);
        }

        info!(
            file = %filename,
            lat_min = row.lat_min,
            lat_max = row.lat_max,
            lon_min = row.lon_min,
            lon_max = row.lon_max,
            "Saved patch"
        );

        Ok(())
    }
}
