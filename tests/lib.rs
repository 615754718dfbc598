//! Tests for lib.rs core types

use std::collections::HashSet;

use xplore::{dedup_points, Area, Bounds, GpsPoint};

#[test]
fn test_gps_point_validation() {
    assert!(GpsPoint::new(51.5074, -0.1278).is_valid());
    assert!(!GpsPoint::new(91.0, 0.0).is_valid());
    assert!(!GpsPoint::new(0.0, 181.0).is_valid());
    assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
}

#[test]
fn test_e7_truncates_toward_zero() {
    let p = GpsPoint::new(40.123456789, -75.987654321);
    assert_eq!(p.to_e7(), [401234567, -759876543]);
}

#[test]
fn test_e7_round_trip_is_stable() {
    let p = GpsPoint::new(40.123456789, -75.987654321);
    let decoded = GpsPoint::from_e7(p.to_e7());
    assert_eq!(decoded.to_e7(), p.to_e7());
}

#[test]
fn test_point_key_exact_equality() {
    let a = GpsPoint::new(40.0, -75.0);
    let b = GpsPoint::new(40.0, -75.0);
    let c = GpsPoint::new(40.0, -75.000000001);
    assert_eq!(a.key(), b.key());
    assert_ne!(a.key(), c.key());
}

#[test]
fn test_point_key_normalizes_negative_zero() {
    let set: HashSet<_> = [GpsPoint::new(0.0, 10.0), GpsPoint::new(-0.0, 10.0)]
        .iter()
        .map(GpsPoint::key)
        .collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_dedup_points_keeps_first_order() {
    let a = GpsPoint::new(1.0, 1.0);
    let b = GpsPoint::new(2.0, 2.0);
    assert_eq!(dedup_points(&[a, b, a, b, a]), vec![a, b]);
}

#[test]
fn test_point_serializes_as_pair() {
    let json = serde_json::to_string(&GpsPoint::new(40.5, -75.25)).unwrap();
    assert_eq!(json, "[40.5,-75.25]");
    let back: GpsPoint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, GpsPoint::new(40.5, -75.25));
}

#[test]
fn test_bounds_from_corners_any_order() {
    let bounds = Bounds::from_corners(GpsPoint::new(41.0, -74.0), GpsPoint::new(40.0, -75.0));
    assert_eq!(bounds.south_west(), GpsPoint::new(40.0, -75.0));
    assert_eq!(bounds.north_east(), GpsPoint::new(41.0, -74.0));
    assert_eq!(bounds.center(), GpsPoint::new(40.5, -74.5));
}

#[test]
fn test_area_parses_both_forms() {
    let rect: Area = serde_json::from_str("[[40.0, -75.0], [40.01, -74.99]]").unwrap();
    assert_eq!(
        rect,
        Area::rectangle(GpsPoint::new(40.0, -75.0), GpsPoint::new(40.01, -74.99))
    );

    let disk: Area = serde_json::from_str(r#"{"center": [40.0, -75.0], "radius_km": 0.5}"#).unwrap();
    assert_eq!(disk, Area::disk(GpsPoint::new(40.0, -75.0), 0.5));
}
