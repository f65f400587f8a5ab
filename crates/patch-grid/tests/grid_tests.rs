//! Comprehensive tests for grid partitioning.

use std::collections::HashSet;

use patch_grid::{partition, BoundingBox, GridError, GridSpec};

// ============================================================================
// Cell count and ordering
// ============================================================================

#[test]
fn test_partition_cell_count() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let cells = partition(&bbox, &GridSpec::new(5, 3)).unwrap();
    assert_eq!(cells.len(), 15);
}

#[test]
fn test_partition_single_cell() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let cells = partition(&bbox, &GridSpec::new(1, 1)).unwrap();

    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].id, "x01y01");
    assert_eq!(cells[0].extent.lat_bottom, 35.0);
    assert_eq!(cells[0].extent.lat_top, 36.0);
    assert_eq!(cells[0].extent.lon_left, 139.0);
    assert_eq!(cells[0].extent.lon_right, 140.0);
}

#[test]
fn test_partition_order_column_major() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let cells = partition(&bbox, &GridSpec::new(2, 2)).unwrap();

    let ids: Vec<&str> = cells.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["x01y01", "x01y02", "x02y01", "x02y02"]);
}

// ============================================================================
// Tiling invariants (no gaps, no overlaps)
// ============================================================================

#[test]
fn test_cells_cover_bbox_exactly() {
    let bbox = BoundingBox::new(35.65601, 35.69912, 139.75306, 139.79820);
    let spec = GridSpec::new(7, 4);
    let cells = partition(&bbox, &spec).unwrap();

    // Outer edges are bit-identical to the box corners.
    for cell in &cells {
        if cell.row == 1 {
            assert_eq!(cell.extent.lat_bottom, bbox.lat_min);
        }
        if cell.row == spec.num_y {
            assert_eq!(cell.extent.lat_top, bbox.lat_max);
        }
        if cell.col == 1 {
            assert_eq!(cell.extent.lon_left, bbox.lon_min);
        }
        if cell.col == spec.num_x {
            assert_eq!(cell.extent.lon_right, bbox.lon_max);
        }
    }

    // Spans sum back to the box dimensions.
    let lat_sum: f64 = cells
        .iter()
        .filter(|c| c.col == 1)
        .map(|c| c.extent.lat_top - c.extent.lat_bottom)
        .sum();
    let lon_sum: f64 = cells
        .iter()
        .filter(|c| c.row == 1)
        .map(|c| c.extent.lon_right - c.extent.lon_left)
        .sum();
    assert!((lat_sum - bbox.height()).abs() < 1e-12);
    assert!((lon_sum - bbox.width()).abs() < 1e-12);
}

#[test]
fn test_adjacent_cells_share_edges() {
    let bbox = BoundingBox::new(-10.0, 20.0, 100.0, 160.0);
    let spec = GridSpec::new(6, 9);
    let cells = partition(&bbox, &spec).unwrap();

    let find = |col: u32, row: u32| cells.iter().find(|c| c.col == col && c.row == row).unwrap();

    for col in 1..=spec.num_x {
        for row in 1..spec.num_y {
            // The top of each row is the bottom of the row above it.
            assert_eq!(
                find(col, row).extent.lat_top,
                find(col, row + 1).extent.lat_bottom
            );
        }
    }

    for row in 1..=spec.num_y {
        for col in 1..spec.num_x {
            // The right edge of each column is the left edge of the next.
            assert_eq!(
                find(col, row).extent.lon_right,
                find(col + 1, row).extent.lon_left
            );
        }
    }
}

#[test]
fn test_row_index_increases_with_latitude() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let cells = partition(&bbox, &GridSpec::new(1, 4)).unwrap();

    for pair in cells.windows(2) {
        assert!(pair[1].extent.lat_bottom > pair[0].extent.lat_bottom);
    }
    assert_eq!(cells[0].extent.lat_bottom, 35.0);
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn test_identifiers_unique() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let cells = partition(&bbox, &GridSpec::new(12, 7)).unwrap();

    let ids: HashSet<&str> = cells.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), cells.len());
}

#[test]
fn test_identifiers_stable_across_runs() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let spec = GridSpec::new(4, 4);

    let first = partition(&bbox, &spec).unwrap();
    let second = partition(&bbox, &spec).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_identifier_padding_widens_for_large_grids() {
    let bbox = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
    let cells = partition(&bbox, &GridSpec::new(120, 2)).unwrap();

    assert_eq!(cells[0].id, "x001y01");
    assert_eq!(cells.last().unwrap().id, "x120y02");
}

// ============================================================================
// Reference scenario: Tokyo quadrants
// ============================================================================

#[test]
fn test_two_by_two_quadrants() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    let cells = partition(&bbox, &GridSpec::new(2, 2)).unwrap();

    assert_eq!(cells.len(), 4);

    let sw = &cells[0];
    assert_eq!(sw.id, "x01y01");
    assert_eq!(sw.extent.lat_bottom, 35.0);
    assert_eq!(sw.extent.lat_top, 35.5);
    assert_eq!(sw.extent.lon_left, 139.0);
    assert_eq!(sw.extent.lon_right, 139.5);

    let ne = cells.iter().find(|c| c.id == "x02y02").unwrap();
    assert_eq!(ne.extent.lat_bottom, 35.5);
    assert_eq!(ne.extent.lat_top, 36.0);
    assert_eq!(ne.extent.lon_left, 139.5);
    assert_eq!(ne.extent.lon_right, 140.0);
}

// ============================================================================
// Invalid inputs
// ============================================================================

#[test]
fn test_zero_columns_rejected() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    assert!(matches!(
        partition(&bbox, &GridSpec::new(0, 5)),
        Err(GridError::InvalidDivisions(_))
    ));
}

#[test]
fn test_zero_rows_rejected() {
    let bbox = BoundingBox::new(35.0, 36.0, 139.0, 140.0);
    assert!(matches!(
        partition(&bbox, &GridSpec::new(5, 0)),
        Err(GridError::InvalidDivisions(_))
    ));
}

#[test]
fn test_inverted_bbox_rejected() {
    let bbox = BoundingBox::new(36.0, 35.0, 139.0, 140.0);
    assert!(matches!(
        partition(&bbox, &GridSpec::new(2, 2)),
        Err(GridError::InvalidBbox(_))
    ));
}

#[test]
fn test_nan_bbox_rejected() {
    let bbox = BoundingBox::new(35.0, 36.0, f64::NAN, 140.0);
    assert!(matches!(
        partition(&bbox, &GridSpec::new(2, 2)),
        Err(GridError::InvalidBbox(_))
    ));
}
