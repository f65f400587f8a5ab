//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// A geographic bounding box in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Check that the box is well-formed: finite corners with
    /// `lat_min < lat_max` and `lon_min < lon_max`.
    pub fn validate(&self) -> GridResult<()> {
        let corners = [self.lat_min, self.lat_max, self.lon_min, self.lon_max];
        if corners.iter().any(|v| !v.is_finite()) {
            return Err(GridError::InvalidBbox(
                "coordinates must be finite".to_string(),
            ));
        }
        if self.lat_min >= self.lat_max {
            return Err(GridError::InvalidBbox(format!(
                "lat_min ({}) must be less than lat_max ({})",
                self.lat_min, self.lat_max
            )));
        }
        if self.lon_min >= self.lon_max {
            return Err(GridError::InvalidBbox(format!(
                "lon_min ({}) must be less than lon_max ({})",
                self.lon_min, self.lon_max
            )));
        }
        Ok(())
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
        assert!(bbox.validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_latitude() {
        let bbox = BoundingBox::new(36.0, 35.0, 139.0, 140.0);
        assert!(matches!(bbox.validate(), Err(GridError::InvalidBbox(_))));
    }

    #[test]
    fn test_validate_degenerate_longitude() {
        let bbox = BoundingBox::new(35.0, 36.0, 139.0, 139.0);
        assert!(matches!(bbox.validate(), Err(GridError::InvalidBbox(_))));
    }

    #[test]
    fn test_validate_non_finite() {
        let bbox = BoundingBox::new(35.0, f64::NAN, 139.0, 140.0);
        assert!(matches!(bbox.validate(), Err(GridError::InvalidBbox(_))));
    }

    #[test]
    fn test_spans() {
        let bbox = BoundingBox::new(35.0, 36.0, 139.0, 141.5);
        assert_eq!(bbox.height(), 1.0);
        assert_eq!(bbox.width(), 2.5);
    }
}
