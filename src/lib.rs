//! # Xplore
//!
//! Find roads you have never been on.
//!
//! This library combines a GPS location history with a grid of road points
//! around a chosen center and reports the road points that are far from
//! anywhere you (or your exclusion list) have already been.
//!
//! This library provides:
//! - Geodesic grid generation over rectangles and disks
//! - Exclusion sets for private and manually visited areas
//! - Location history loading (Google Takeout archives, GPX folders)
//! - Road snapping through the Google Roads API with an on-disk cache
//! - A nearest-neighbour proximity index over visited points
//! - Exploration gap detection, sorted by distance from the center
//! - Leaflet map and GeoJSON rendering of the result
//!
//! ## Features
//!
//! - **`parallel`** - Parallel gap queries and snapping batches with rayon
//! - **`http`** - Google Roads API client
//!
//! ## Quick Start
//!
//! ```rust
//! use xplore::{find_unexplored, GpsPoint, ProximityIndex};
//!
//! let center = GpsPoint::new(40.0, -75.0);
//! let visited = vec![center];
//! let index = ProximityIndex::with_neighbors(&visited, &[], 1).unwrap();
//!
//! let roads = vec![GpsPoint::new(40.0, -74.99), GpsPoint::new(40.0001, -75.0)];
//! let gaps = find_unexplored(&index, &roads, center, 1.0, 50.0);
//! assert_eq!(gaps, vec![GpsPoint::new(40.0, -74.99)]);
//! ```

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, XploreError};

// Geographic utilities (distance, destination, bounds)
pub mod geo_utils;

// Run configuration
pub mod config;
pub use config::{ExploreConfig, RoadsClientConfig};

// Candidate point grids
pub mod grid;
pub use grid::{generate_disk_grid, generate_grid, generate_rect_grid, MAX_GRID_STEPS};

// Points that are never candidates for exploration
pub mod exclusions;
pub use exclusions::{build_exclusions, ExclusionConfig};

// Location history sources
pub mod history;
pub use history::{load_gpx_dir, load_takeout_zip, HistoryRecord, RollingHistory};

// Grid-to-road cache
pub mod cache;
pub use cache::GridCache;

// Road snapping
pub mod progress;
pub mod roads;
pub use roads::{snap_to_roads, RoadsApi, SnappedPoint};

// Google Roads API client
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::GoogleRoadsClient;

// Nearest-neighbour index over visited and excluded points
pub mod index;
pub use index::{Nearest, ProximityIndex, DEFAULT_NEIGHBORS};

// Exploration gap detection
pub mod gaps;
pub use gaps::{find_unexplored, score_road_points, GapCandidate};

// Map rendering
pub mod map;
pub use map::{render_map, write_geojson, MapArtifact};

// End-to-end run
pub mod pipeline;
pub use pipeline::{run_exploration, ExplorationResult};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude in decimal degrees.
///
/// # Example
/// ```
/// use xplore::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Encode as E7 integers (degrees × 1e7, truncated toward zero).
    pub fn to_e7(&self) -> [i64; 2] {
        [
            (self.latitude * 1e7) as i64,
            (self.longitude * 1e7) as i64,
        ]
    }

    /// Decode a point from E7 integers.
    pub fn from_e7(e7: [i64; 2]) -> Self {
        Self::new(e7[0] as f64 / 1e7, e7[1] as f64 / 1e7)
    }

    /// Exact-equality key for hashing.
    pub fn key(&self) -> PointKey {
        PointKey::from(*self)
    }
}

impl From<[f64; 2]> for GpsPoint {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<GpsPoint> for [f64; 2] {
    fn from(p: GpsPoint) -> Self {
        [p.latitude, p.longitude]
    }
}

/// Hashable key with exact floating-point equality.
///
/// `-0.0` is folded into `0.0` so both compare equal, matching `f64`'s own
/// `==`. No tolerance is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointKey(u64, u64);

impl From<GpsPoint> for PointKey {
    fn from(p: GpsPoint) -> Self {
        fn bits(v: f64) -> u64 {
            if v == 0.0 {
                0.0f64.to_bits()
            } else {
                v.to_bits()
            }
        }
        PointKey(bits(p.latitude), bits(p.longitude))
    }
}

impl Hash for PointKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

/// Keep the first occurrence of each distinct point, preserving order.
pub fn dedup_points(points: &[GpsPoint]) -> Vec<GpsPoint> {
    let mut seen = std::collections::HashSet::with_capacity(points.len());
    points
        .iter()
        .filter(|p| seen.insert(p.key()))
        .copied()
        .collect()
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Bounds spanned by two opposite corners, in any order.
    pub fn from_corners(a: GpsPoint, b: GpsPoint) -> Self {
        Self {
            min_lat: a.latitude.min(b.latitude),
            max_lat: a.latitude.max(b.latitude),
            min_lng: a.longitude.min(b.longitude),
            max_lng: a.longitude.max(b.longitude),
        }
    }

    /// South-west corner.
    pub fn south_west(&self) -> GpsPoint {
        GpsPoint::new(self.min_lat, self.min_lng)
    }

    /// North-east corner.
    pub fn north_east(&self) -> GpsPoint {
        GpsPoint::new(self.max_lat, self.max_lng)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A geographic area to cover with grid points.
///
/// Serialized either as two opposite corners, `[[lat, lon], [lat, lon]]`,
/// or as a disk, `{"center": [lat, lon], "radius_km": 1.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Area {
    Disk { center: GpsPoint, radius_km: f64 },
    Rectangle(GpsPoint, GpsPoint),
}

impl Area {
    /// Rectangle from two opposite corners.
    pub fn rectangle(corner_a: GpsPoint, corner_b: GpsPoint) -> Self {
        Area::Rectangle(corner_a, corner_b)
    }

    /// Disk around `center`.
    pub fn disk(center: GpsPoint, radius_km: f64) -> Self {
        Area::Disk { center, radius_km }
    }
}
