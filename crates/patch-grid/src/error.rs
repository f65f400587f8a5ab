//! Error types for grid partitioning.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors produced while validating or partitioning a grid.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid grid divisions: {0}")]
    InvalidDivisions(String),
}
