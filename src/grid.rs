//! Candidate point grids.
//!
//! Grids are the cross product of two independent geodesic walks from a
//! common origin: one along the meridian (latitudes) and one along the
//! east-west bearing (longitudes). They are not true geodesic squares, which
//! is fine for the spacings used here (tens to hundreds of meters).
//!
//! Enumeration is latitude-major, then longitude, and fully deterministic.

use log::debug;

use crate::geo_utils::{destination, geodesic_km, EAST, NORTH, SOUTH, WEST};
use crate::{Area, Bounds, GpsPoint, Result, XploreError};

/// Maximum number of steps along either axis of one area.
///
/// Anything larger is almost certainly a misconfigured area (swapped
/// coordinates, km given as m) rather than an intended grid.
pub const MAX_GRID_STEPS: usize = 999;

/// Generate grid points covering `area` with `spacing_m` meters between them.
pub fn generate_grid(area: &Area, spacing_m: f64) -> Result<Vec<GpsPoint>> {
    match *area {
        Area::Rectangle(a, b) => generate_rect_grid(a, b, spacing_m),
        Area::Disk { center, radius_km } => generate_disk_grid(center, radius_km, spacing_m),
    }
}

/// Grid over the rectangle spanned by two opposite corners.
///
/// Walks north and east from the south-west corner, one `spacing_m` step at a
/// time, until the walk reaches or passes the north (east) edge. The last
/// step may overshoot the edge. The corner itself is not part of the walk.
pub fn generate_rect_grid(
    corner_a: GpsPoint,
    corner_b: GpsPoint,
    spacing_m: f64,
) -> Result<Vec<GpsPoint>> {
    check_spacing(spacing_m)?;
    let bounds = Bounds::from_corners(corner_a, corner_b);
    let start = bounds.south_west();

    let lats = walk_until(&start, NORTH, spacing_m, "latitude", |p| {
        p.latitude < bounds.max_lat
    })?
    .into_iter()
    .map(|p| p.latitude)
    .collect::<Vec<_>>();

    let lngs = walk_until(&start, EAST, spacing_m, "longitude", |p| {
        p.longitude < bounds.max_lng
    })?
    .into_iter()
    .map(|p| p.longitude)
    .collect::<Vec<_>>();

    debug!(
        "rectangle grid {:?}: {} x {} points at {}m",
        bounds,
        lats.len(),
        lngs.len(),
        spacing_m
    );

    Ok(cross_product(&lats, &lngs))
}

/// Grid over the disk of `radius_km` around `center`.
///
/// Builds the full bounding square of `2n + 1` latitudes and longitudes
/// (`n = ceil(radius / spacing)`) and then keeps only points whose geodesic
/// distance to `center` is within the radius.
pub fn generate_disk_grid(
    center: GpsPoint,
    radius_km: f64,
    spacing_m: f64,
) -> Result<Vec<GpsPoint>> {
    check_spacing(spacing_m)?;
    if !(radius_km >= 0.0) || !radius_km.is_finite() {
        return Err(XploreError::InvalidConfig(format!(
            "radius_km must be a non-negative number, got {radius_km}"
        )));
    }

    let n = (1000.0 * radius_km / spacing_m).ceil() as usize;
    if n > MAX_GRID_STEPS {
        return Err(XploreError::AreaTooLarge {
            axis: "latitude",
            max_steps: MAX_GRID_STEPS,
        });
    }

    let mut lats = Vec::with_capacity(2 * n + 1);
    let mut lngs = Vec::with_capacity(2 * n + 1);
    for i in -(n as i64)..=(n as i64) {
        let distance_m = i.unsigned_abs() as f64 * spacing_m;
        let (lat_bearing, lng_bearing) = if i > 0 { (NORTH, EAST) } else { (SOUTH, WEST) };
        lats.push(destination(&center, lat_bearing, distance_m).latitude);
        lngs.push(destination(&center, lng_bearing, distance_m).longitude);
    }

    let points: Vec<GpsPoint> = cross_product(&lats, &lngs)
        .into_iter()
        .filter(|p| geodesic_km(p, &center) <= radius_km)
        .collect();

    debug!(
        "disk grid around {:?} r={}km: {} of {} square points kept",
        center,
        radius_km,
        points.len(),
        lats.len() * lngs.len()
    );

    Ok(points)
}

/// Step from `origin` along `bearing` while `keep_going` holds for the
/// previous position, collecting every step.
fn walk_until<F>(
    origin: &GpsPoint,
    bearing: f64,
    spacing_m: f64,
    axis: &'static str,
    keep_going: F,
) -> Result<Vec<GpsPoint>>
where
    F: Fn(&GpsPoint) -> bool,
{
    let mut steps = Vec::new();
    let mut current = *origin;
    while keep_going(&current) {
        if steps.len() == MAX_GRID_STEPS {
            return Err(XploreError::AreaTooLarge {
                axis,
                max_steps: MAX_GRID_STEPS,
            });
        }
        current = destination(origin, bearing, (steps.len() + 1) as f64 * spacing_m);
        steps.push(current);
    }
    Ok(steps)
}

fn cross_product(lats: &[f64], lngs: &[f64]) -> Vec<GpsPoint> {
    lats.iter()
        .flat_map(|&lat| lngs.iter().map(move |&lng| GpsPoint::new(lat, lng)))
        .collect()
}

fn check_spacing(spacing_m: f64) -> Result<()> {
    if spacing_m > 0.0 && spacing_m.is_finite() {
        Ok(())
    } else {
        Err(XploreError::InvalidConfig(format!(
            "grid spacing must be a positive number of meters, got {spacing_m}"
        )))
    }
}
