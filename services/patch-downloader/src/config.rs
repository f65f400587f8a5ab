//! Preferences loading for the patch downloader.
//!
//! The preferences file is a JSON document holding the tile source and
//! output settings. When the file is missing the default set is written
//! to it, so the first run leaves an editable template behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Run parameters loaded once at startup, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Tile URL template with {x}, {y} and {z} placeholders
    pub url: String,
    /// Pixels per tile edge
    pub tile_size: u32,
    /// Image channel count (3 = RGB, anything else = RGBA)
    pub channels: u8,
    /// Output directory, created if absent
    pub dir: PathBuf,
    /// HTTP headers forwarded on every tile request
    pub headers: BTreeMap<String, String>,
    /// Map zoom level
    pub zoom: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("cache-control".to_string(), "max-age=0".to_string());
        headers.insert(
            "sec-ch-ua".to_string(),
            "\" Not A;Brand\";v=\"99\", \"Chromium\";v=\"99\", \"Google Chrome\";v=\"99\""
                .to_string(),
        );
        headers.insert("sec-ch-ua-mobile".to_string(), "?0".to_string());
        headers.insert("sec-ch-ua-platform".to_string(), "\"Windows\"".to_string());
        headers.insert("sec-fetch-dest".to_string(), "document".to_string());
        headers.insert("sec-fetch-mode".to_string(), "navigate".to_string());
        headers.insert("sec-fetch-site".to_string(), "none".to_string());
        headers.insert("sec-fetch-user".to_string(), "?1".to_string());
        headers.insert("upgrade-insecure-requests".to_string(), "1".to_string());
        headers.insert(
            "user-agent".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
             Chrome/99.0.4844.82 Safari/537.36"
                .to_string(),
        );

        Self {
            url: "https://mt.google.com/vt/lyrs=s&x={x}&y={y}&z={z}".to_string(),
            tile_size: 256,
            channels: 3,
            dir: PathBuf::from("range_images"),
            headers,
            zoom: 21,
        }
    }
}

impl Preferences {
    /// Load preferences from `path`, or persist and return the defaults
    /// when the file does not exist. A malformed file is a fatal error.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.is_file() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
            let prefs: Preferences = serde_json::from_str(&content).with_context(|| {
                format!("Failed to parse preferences file: {}", path.display())
            })?;
            Ok(prefs)
        } else {
            let prefs = Self::default();
            let content = serde_json::to_string_pretty(&prefs)?;
            std::fs::write(path, content).with_context(|| {
                format!("Failed to write preferences file: {}", path.display())
            })?;
            info!(path = %path.display(), "Preferences file created with defaults");
            Ok(prefs)
        }
    }
}
