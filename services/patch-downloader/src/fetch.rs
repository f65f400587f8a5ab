//! Tile fetching and stitching for a single grid cell.
//!
//! A cell's geographic extent is projected to Web Mercator pixel space at
//! the configured zoom level, the XYZ tiles covering that pixel rectangle
//! are fetched and pasted onto a canvas, and the canvas becomes the
//! cell's image.

use std::f64::consts::PI;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops, DynamicImage, RgbaImage};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use patch_grid::CellExtent;

use crate::config::Preferences;

/// Errors produced while acquiring one cell's image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Tile request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tile server returned {status} for {url}")]
    TileStatus { status: StatusCode, url: String },

    #[error("Failed to decode tile image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Cell extent projects to an empty pixel area at zoom {0}")]
    EmptyExtent(u32),
}

/// Source of rendered imagery for a cell extent.
///
/// The batch runner only sees this seam, so tests drive it with stub
/// implementations and the production fetcher stays swappable.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch_patch(&self, extent: &CellExtent) -> Result<DynamicImage, FetchError>;
}

/// Fetches XYZ tiles over HTTP and stitches them into per-cell images.
pub struct HttpTileFetcher {
    client: Client,
    url_template: String,
    tile_size: u32,
    channels: u8,
    zoom: u32,
}

impl HttpTileFetcher {
    /// Build a fetcher from the loaded preferences. The configured headers
    /// become client defaults so every tile request carries them.
    pub fn new(prefs: &Preferences) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &prefs.headers {
            let name: HeaderName = name
                .parse()
                .with_context(|| format!("Invalid header name: {name}"))?;
            let value: HeaderValue = value
                .parse()
                .with_context(|| format!("Invalid value for header: {name}"))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url_template: prefs.url.clone(),
            tile_size: prefs.tile_size,
            channels: prefs.channels,
            zoom: prefs.zoom,
        })
    }

    fn tile_url(&self, x: i64, y: i64) -> String {
        self.url_template
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{z}", &self.zoom.to_string())
    }
}

/// Project a lat/lon pair to global pixel coordinates at `zoom`.
///
/// Standard Web Mercator; latitude is clamped just short of the poles so
/// the projection stays finite.
fn project(lat: f64, lon: f64, zoom: u32, tile_size: u32) -> (f64, f64) {
    let scale = (1u64 << zoom) as f64;
    let siny = lat.to_radians().sin().clamp(-0.9999, 0.9999);
    let x = scale * (0.5 + lon / 360.0);
    let y = scale * (0.5 - ((1.0 + siny) / (1.0 - siny)).ln() / (4.0 * PI));
    (x * tile_size as f64, y * tile_size as f64)
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch_patch(&self, extent: &CellExtent) -> Result<DynamicImage, FetchError> {
        let ts = self.tile_size as i64;

        // North-west and south-east corners in global pixel space.
        let (x0, y0) = project(extent.lat_top, extent.lon_left, self.zoom, self.tile_size);
        let (x1, y1) = project(extent.lat_bottom, extent.lon_right, self.zoom, self.tile_size);

        let width = (x1 - x0).round() as i64;
        let height = (y1 - y0).round() as i64;
        if width <= 0 || height <= 0 {
            return Err(FetchError::EmptyExtent(self.zoom));
        }

        let origin_x = x0.round() as i64;
        let origin_y = y0.round() as i64;

        let tx0 = (x0 / ts as f64).floor() as i64;
        let tx1 = (x1 / ts as f64).floor() as i64;
        let ty0 = (y0 / ts as f64).floor() as i64;
        let ty1 = (y1 / ts as f64).floor() as i64;

        let mut canvas = RgbaImage::new(width as u32, height as u32);

        for tx in tx0..=tx1 {
            for ty in ty0..=ty1 {
                let url = self.tile_url(tx, ty);
                let response = self.client.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(FetchError::TileStatus {
                        status: response.status(),
                        url,
                    });
                }
                let bytes = response.bytes().await?;
                let tile = image::load_from_memory(&bytes)?.to_rgba8();
                debug!(x = tx, y = ty, z = self.zoom, "Fetched tile");

                // Tiles at the rectangle's rim hang over the canvas edge;
                // overlay clips them to the intersection.
                imageops::overlay(&mut canvas, &tile, tx * ts - origin_x, ty * ts - origin_y);
            }
        }

        let canvas = DynamicImage::ImageRgba8(canvas);
        if self.channels == 3 {
            Ok(DynamicImage::ImageRgb8(canvas.to_rgb8()))
        } else {
            Ok(canvas)
        }
    }
}
