//! CSV ledger of successfully acquired patches.
//!
//! One row per image written, appended in completion order. The file is
//! opened in truncate mode: a re-run rebuilds the corpus from scratch.
//! Rows are flushed as they are appended, so a crash loses at most the
//! cell in flight.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Column header naming the ledger fields.
pub const HEADER: &str = "filename,lat_min,lat_max,lon_min,lon_max";

/// One successfully acquired patch.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub filename: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Scoped writer for the acquisition ledger.
///
/// `finish` must be called once the batch is done so buffered rows are
/// synced to disk before the handle is dropped.
pub struct Ledger {
    file: File,
    path: PathBuf,
}

impl Ledger {
    /// Create (or truncate) the ledger at `path` and write the header.
    pub async fn create(path: &Path) -> Result<Self> {
        let mut file = File::create(path)
            .await
            .with_context(|| format!("Failed to create ledger file: {}", path.display()))?;
        file.write_all(HEADER.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append one row and flush it to disk.
    pub async fn append(&mut self, row: &LedgerRow) -> Result<()> {
        let line = format!(
            "{},{},{},{},{}\n",
            row.filename, row.lat_min, row.lat_max, row.lon_min, row.lon_max
        );
        self.file
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append ledger row for {}", row.filename))?;
        self.file.flush().await?;
        Ok(())
    }

    /// Flush and sync the ledger file.
    pub async fn finish(&mut self) -> Result<()> {
        self.file.flush().await?;
        self.file
            .sync_all()
            .await
            .with_context(|| format!("Failed to sync ledger file: {}", self.path.display()))?;
        Ok(())
    }
}
