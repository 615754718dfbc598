//! Exploration gap detection.
//!
//! A road point is a gap when no visited or excluded point lies within the
//! grid spacing of it. Gaps are returned nearest-to-center first, which is
//! the order someone planning a ride or walk from the center wants them in.

use std::cmp::Ordering;

use log::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geo_utils::haversine_km;
use crate::index::ProximityIndex;
use crate::{dedup_points, GpsPoint};

/// A road point inside the search radius with its distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapCandidate {
    pub point: GpsPoint,
    /// Distance to the nearest visited/excluded point, in kilometers.
    pub nearest_km: f64,
    /// Great-circle distance to the search center, in kilometers.
    pub center_km: f64,
}

/// Whether a road point with its nearest visited point `nearest_km` away
/// counts as unexplored at this grid spacing.
///
/// The threshold is strict: a point exactly one spacing away is covered.
pub fn is_unexplored(nearest_km: f64, spacing_m: f64) -> bool {
    nearest_km > spacing_m / 1000.0
}

/// Score every distinct road point strictly inside `radius_km` of `center`.
///
/// Output follows the first-seen order of `road_points`.
pub fn score_road_points(
    index: &ProximityIndex,
    road_points: &[GpsPoint],
    center: GpsPoint,
    radius_km: f64,
) -> Vec<GapCandidate> {
    let in_radius: Vec<(GpsPoint, f64)> = dedup_points(road_points)
        .into_iter()
        .map(|p| (p, haversine_km(&p, &center)))
        .filter(|&(_, center_km)| center_km < radius_km)
        .collect();

    let score = |&(point, center_km): &(GpsPoint, f64)| GapCandidate {
        point,
        nearest_km: index.nearest_distance(&point).distance_km,
        center_km,
    };

    #[cfg(feature = "parallel")]
    let candidates: Vec<GapCandidate> = in_radius.par_iter().map(score).collect();

    #[cfg(not(feature = "parallel"))]
    let candidates: Vec<GapCandidate> = in_radius.iter().map(score).collect();

    candidates
}

/// Road points with no visited or excluded point within `spacing_m`,
/// sorted by ascending distance from `center`.
///
/// Duplicate road points are reported once. Points at or beyond
/// `radius_km` from the center are ignored. Ties in center distance are
/// broken by latitude then longitude so the order is fully deterministic.
pub fn find_unexplored(
    index: &ProximityIndex,
    road_points: &[GpsPoint],
    center: GpsPoint,
    radius_km: f64,
    spacing_m: f64,
) -> Vec<GpsPoint> {
    let candidates = score_road_points(index, road_points, center, radius_km);
    let in_radius = candidates.len();

    let mut gaps: Vec<GapCandidate> = candidates
        .into_iter()
        .filter(|c| is_unexplored(c.nearest_km, spacing_m))
        .collect();
    gaps.sort_by(compare_from_center);

    info!(
        "have {} non-visited points ({} road points in radius)",
        gaps.len(),
        in_radius
    );

    gaps.into_iter().map(|c| c.point).collect()
}

fn compare_from_center(a: &GapCandidate, b: &GapCandidate) -> Ordering {
    a.center_km
        .total_cmp(&b.center_km)
        .then_with(|| a.point.latitude.total_cmp(&b.point.latitude))
        .then_with(|| a.point.longitude.total_cmp(&b.point.longitude))
}
