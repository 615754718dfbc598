//! Tests for grid generation

use xplore::geo_utils::geodesic_km;
use xplore::{
    generate_disk_grid, generate_grid, generate_rect_grid, Area, GpsPoint, XploreError,
};

fn distinct_lats(points: &[GpsPoint]) -> Vec<f64> {
    let mut lats: Vec<f64> = points.iter().map(|p| p.latitude).collect();
    lats.dedup();
    lats
}

#[test]
fn test_rect_grid_walks_past_north_east_corner() {
    let sw = GpsPoint::new(40.0, -75.0);
    let ne = GpsPoint::new(40.01, -74.99);
    let grid = generate_rect_grid(sw, ne, 100.0).unwrap();

    let lats = distinct_lats(&grid);
    assert!(lats.len() > 1);
    assert!(lats.iter().all(|&lat| lat > sw.latitude));
    // Last row reaches or passes the north edge, the one before does not
    assert!(lats[lats.len() - 1] >= ne.latitude);
    assert!(lats[lats.len() - 2] < ne.latitude);

    let per_row = grid.len() / lats.len();
    assert_eq!(grid.len(), lats.len() * per_row);
    let first_row = &grid[..per_row];
    assert!(first_row.iter().all(|p| p.latitude == lats[0]));
    assert!(first_row[per_row - 1].longitude >= ne.longitude);
    assert!(first_row[per_row - 2].longitude < ne.longitude);
}

#[test]
fn test_rect_grid_corner_order_does_not_matter() {
    let expected = generate_rect_grid(
        GpsPoint::new(40.0, -75.0),
        GpsPoint::new(40.005, -74.995),
        100.0,
    )
    .unwrap();

    let swapped = generate_rect_grid(
        GpsPoint::new(40.005, -74.995),
        GpsPoint::new(40.0, -75.0),
        100.0,
    )
    .unwrap();
    let nw_se = generate_rect_grid(
        GpsPoint::new(40.005, -75.0),
        GpsPoint::new(40.0, -74.995),
        100.0,
    )
    .unwrap();

    assert_eq!(swapped, expected);
    assert_eq!(nw_se, expected);
}

#[test]
fn test_rect_grid_rejects_huge_area() {
    let result = generate_rect_grid(GpsPoint::new(0.0, 0.0), GpsPoint::new(10.0, 10.0), 100.0);
    assert!(matches!(result, Err(XploreError::AreaTooLarge { .. })));
}

#[test]
fn test_disk_grid_count() {
    // n = 3 steps each way; keeps the points within 2.4 spacings of the center
    let center = GpsPoint::new(40.0, -75.0);
    let grid = generate_disk_grid(center, 0.12, 50.0).unwrap();
    assert_eq!(grid.len(), 21);
}

#[test]
fn test_disk_grid_stays_in_radius() {
    let center = GpsPoint::new(40.0, -75.0);
    let grid = generate_disk_grid(center, 1.0, 50.0).unwrap();
    assert!(!grid.is_empty());
    assert!(grid.iter().all(|p| geodesic_km(p, &center) <= 1.0));
    assert!(grid
        .iter()
        .any(|p| (p.latitude - 40.0).abs() < 1e-9 && (p.longitude + 75.0).abs() < 1e-9));
}

#[test]
fn test_disk_grid_is_deterministic() {
    let center = GpsPoint::new(40.0, -75.0);
    let a = generate_disk_grid(center, 0.5, 50.0).unwrap();
    let b = generate_disk_grid(center, 0.5, 50.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_disk_grid_rejects_huge_radius() {
    let result = generate_disk_grid(GpsPoint::new(40.0, -75.0), 100.0, 100.0);
    assert!(matches!(result, Err(XploreError::AreaTooLarge { max_steps: 999, .. })));
}

#[test]
fn test_zero_spacing_is_invalid() {
    let result = generate_disk_grid(GpsPoint::new(40.0, -75.0), 1.0, 0.0);
    assert!(matches!(result, Err(XploreError::InvalidConfig(_))));
}

#[test]
fn test_generate_grid_dispatches_on_area() {
    let center = GpsPoint::new(40.0, -75.0);
    assert_eq!(
        generate_grid(&Area::disk(center, 0.2), 50.0).unwrap(),
        generate_disk_grid(center, 0.2, 50.0).unwrap()
    );

    let ne = GpsPoint::new(40.002, -74.998);
    assert_eq!(
        generate_grid(&Area::rectangle(center, ne), 50.0).unwrap(),
        generate_rect_grid(center, ne, 50.0).unwrap()
    );
}

#[test]
fn test_rect_grid_rows_are_one_spacing_apart() {
    let sw = GpsPoint::new(51.5, -0.15);
    let ne = GpsPoint::new(51.51, -0.13);
    let grid = generate_rect_grid(sw, ne, 200.0).unwrap();
    let lats = distinct_lats(&grid);

    for pair in lats.windows(2) {
        let a = GpsPoint::new(pair[0], sw.longitude);
        let b = GpsPoint::new(pair[1], sw.longitude);
        assert!((geodesic_km(&a, &b) - 0.2).abs() < 1e-6);
    }
}

#[test]
fn test_finer_spacing_gives_more_points() {
    let sw = GpsPoint::new(40.0, -75.0);
    let ne = GpsPoint::new(40.01, -74.99);
    let coarse = generate_rect_grid(sw, ne, 200.0).unwrap();
    let fine = generate_rect_grid(sw, ne, 100.0).unwrap();
    assert!(fine.len() > 3 * coarse.len());
}
