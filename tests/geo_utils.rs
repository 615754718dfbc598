//! Tests for geo_utils module

use xplore::geo_utils::*;
use xplore::GpsPoint;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_haversine_distance_same_point() {
    let p = GpsPoint::new(51.5074, -0.1278);
    assert_eq!(haversine_distance(&p, &p), 0.0);
}

#[test]
fn test_haversine_distance_known_value() {
    // London to Paris is approximately 344 km
    let london = GpsPoint::new(51.5074, -0.1278);
    let paris = GpsPoint::new(48.8566, 2.3522);
    let dist = haversine_distance(&london, &paris);
    assert!(approx_eq(dist, 343_560.0, 5000.0)); // Within 5km
}

#[test]
fn test_haversine_km_matches_meters() {
    let a = GpsPoint::new(40.0, -75.0);
    let b = GpsPoint::new(40.01, -75.01);
    assert!(approx_eq(haversine_km(&a, &b) * 1000.0, haversine_distance(&a, &b), 1e-6));
}

#[test]
fn test_geodesic_close_to_haversine() {
    let a = GpsPoint::new(40.0, -75.0);
    let b = GpsPoint::new(40.02, -74.97);
    let geodesic = geodesic_km(&a, &b);
    let haversine = haversine_km(&a, &b);
    // Spherical vs ellipsoidal models differ by well under 1%
    assert!((geodesic - haversine).abs() / geodesic < 0.01);
}

#[test]
fn test_destination_north_one_km() {
    let origin = GpsPoint::new(40.0, -75.0);
    let north = destination(&origin, NORTH, 1000.0);
    assert!(north.latitude > origin.latitude);
    assert!(approx_eq(north.longitude, origin.longitude, 1e-9));
    assert!(approx_eq(geodesic_km(&origin, &north), 1.0, 1e-6));
}

#[test]
fn test_destination_east_and_west_are_symmetric() {
    let origin = GpsPoint::new(40.0, -75.0);
    let east = destination(&origin, EAST, 500.0);
    let west = destination(&origin, WEST, 500.0);
    assert!(east.longitude > origin.longitude);
    assert!(west.longitude < origin.longitude);
    assert!(approx_eq(
        east.longitude - origin.longitude,
        origin.longitude - west.longitude,
        1e-9
    ));
}

#[test]
fn test_destination_south() {
    let origin = GpsPoint::new(40.0, -75.0);
    let south = destination(&origin, SOUTH, 2000.0);
    assert!(south.latitude < origin.latitude);
    assert!(approx_eq(geodesic_km(&origin, &south), 2.0, 1e-6));
}
