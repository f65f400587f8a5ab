//! Regular lat/lon grid partitioning.
//!
//! A bounding box is divided into `num_x * num_y` rectangular cells of
//! equal size. Columns run west to east and rows run south to north:
//! cell (1, 1) is the south-west corner of the box and row indices
//! increase with latitude.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{GridError, GridResult};

/// How a bounding box is subdivided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns (along longitude)
    pub num_x: u32,
    /// Number of rows (along latitude)
    pub num_y: u32,
}

impl GridSpec {
    pub fn new(num_x: u32, num_y: u32) -> Self {
        Self { num_x, num_y }
    }

    /// Check that both division counts are positive.
    pub fn validate(&self) -> GridResult<()> {
        if self.num_x == 0 || self.num_y == 0 {
            return Err(GridError::InvalidDivisions(format!(
                "num_x ({}) and num_y ({}) must both be at least 1",
                self.num_x, self.num_y
            )));
        }
        Ok(())
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.num_x as usize * self.num_y as usize
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.num_x == 0 || self.num_y == 0
    }

    /// Zero-pad width for cell identifiers: at least two digits, widening
    /// for grids with more than 99 divisions per axis so identifiers stay
    /// unique and sort correctly.
    pub fn id_width(&self) -> usize {
        let digits = self.num_x.max(self.num_y).to_string().len();
        digits.max(2)
    }
}

/// Geographic extent of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellExtent {
    pub lat_top: f64,
    pub lat_bottom: f64,
    pub lon_left: f64,
    pub lon_right: f64,
}

/// One rectangular sub-region of the bounding box, the unit of acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// 1-based column index (west to east)
    pub col: u32,
    /// 1-based row index (south to north)
    pub row: u32,
    /// Stable identifier, e.g. `x01y01`; image filename stem and ledger key
    pub id: String,
    pub extent: CellExtent,
}

/// Format the identifier for the cell at `(col, row)` with the given
/// zero-pad width.
///
/// Identifiers are deterministic: the same grid parameters always produce
/// the same identifiers across runs.
pub fn cell_identifier(col: u32, row: u32, width: usize) -> String {
    format!("x{col:0width$}y{row:0width$}")
}

/// `count + 1` equally spaced values from `min` to `max`, inclusive of
/// both endpoints.
fn edges(min: f64, max: f64, count: u32) -> Vec<f64> {
    let span = max - min;
    (0..=count)
        .map(|i| {
            if i == count {
                max
            } else {
                min + span * i as f64 / count as f64
            }
        })
        .collect()
}

/// Latitude interval `(lat_bottom, lat_top)` of the 1-based row index.
///
/// Rows count upward from the south: row `j` spans `lat_edges[j - 1]` to
/// `lat_edges[j]`, so the bottom of row `j` is the top of row `j - 1`.
fn row_latitudes(lat_edges: &[f64], row: u32) -> (f64, f64) {
    (lat_edges[row as usize - 1], lat_edges[row as usize])
}

/// Longitude interval `(lon_left, lon_right)` of the 1-based column index.
///
/// Columns count eastward from the west edge: column `i` spans
/// `lon_edges[i - 1]` to `lon_edges[i]`.
fn column_longitudes(lon_edges: &[f64], col: u32) -> (f64, f64) {
    (lon_edges[col as usize - 1], lon_edges[col as usize])
}

/// Partition `bbox` into `spec.num_x * spec.num_y` cells.
///
/// Both axes are divided into equal intervals between the box edges, so
/// the cells tile the box with no gaps or overlaps. Cells are produced
/// column by column (west to east) and within each column row by row
/// (south to north); the order is stable so downstream bookkeeping can
/// rely on it.
pub fn partition(bbox: &BoundingBox, spec: &GridSpec) -> GridResult<Vec<Cell>> {
    bbox.validate()?;
    spec.validate()?;

    let lat_edges = edges(bbox.lat_min, bbox.lat_max, spec.num_y);
    let lon_edges = edges(bbox.lon_min, bbox.lon_max, spec.num_x);
    let width = spec.id_width();

    let mut cells = Vec::with_capacity(spec.len());
    for col in 1..=spec.num_x {
        for row in 1..=spec.num_y {
            let (lon_left, lon_right) = column_longitudes(&lon_edges, col);
            let (lat_bottom, lat_top) = row_latitudes(&lat_edges, row);
            cells.push(Cell {
                col,
                row,
                id: cell_identifier(col, row, width),
                extent: CellExtent {
                    lat_top,
                    lat_bottom,
                    lon_left,
                    lon_right,
                },
            });
        }
    }

    Ok(cells)
}
