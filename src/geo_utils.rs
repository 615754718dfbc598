//! Geographic utilities.
//!
//! - Haversine great-circle distance (spherical earth)
//! - Geodesic distance and destination projection on the WGS84 ellipsoid

use geo::{Destination, Distance, Geodesic, Point};

use crate::GpsPoint;

/// Mean earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Compass bearings in degrees.
pub const NORTH: f64 = 0.0;
pub const EAST: f64 = 90.0;
pub const SOUTH: f64 = 180.0;
pub const WEST: f64 = 270.0;

/// Haversine distance between two points in meters.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlng = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Haversine distance between two points in kilometers.
pub fn haversine_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine_distance(p1, p2) / 1000.0
}

/// Geodesic (ellipsoidal) distance between two points in kilometers.
pub fn geodesic_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Geodesic.distance(to_geo(p1), to_geo(p2)) / 1000.0
}

/// Project `distance_m` meters from `origin` along `bearing` degrees.
pub fn destination(origin: &GpsPoint, bearing: f64, distance_m: f64) -> GpsPoint {
    from_geo(Geodesic.destination(to_geo(origin), bearing, distance_m))
}

fn to_geo(p: &GpsPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

fn from_geo(p: Point<f64>) -> GpsPoint {
    GpsPoint::new(p.y(), p.x())
}
