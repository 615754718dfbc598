//! Proximity index over visited and excluded points.
//!
//! Two-stage nearest-neighbour query:
//! 1. An R-tree over raw `(lat, lng)` pairs returns the `k` nearest points by
//!    planar Euclidean distance in degree space.
//! 2. The haversine distance to each of those `k` candidates is computed and
//!    the minimum returned.
//!
//! Degree-space distance stretches longitudes by `1 / cos(lat)`, so the
//! geodesically nearest point may fall outside the `k` candidates. The result
//! is then an overestimate of the true minimum. With `k = 30` this is
//! negligible away from the poles and over city-sized areas.
//!
//! The index is built once and only read afterwards; it is `Sync` and can be
//! queried from many threads.

use std::collections::HashSet;

use log::info;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo_utils::haversine_km;
use crate::{GpsPoint, PointKey, Result, XploreError};

/// Neighbours retrieved per query before exact re-ranking.
pub const DEFAULT_NEIGHBORS: usize = 30;

/// A point stored with its position in the index's point cloud.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlng = self.lng - point[1];
        dlat * dlat + dlng * dlng
    }
}

/// Result of a proximity query.
#[derive(Debug, Clone, PartialEq)]
pub struct Nearest {
    /// Haversine distance to the closest of the candidates, in kilometers.
    pub distance_km: f64,
    /// Point-cloud indices of the `k` Euclidean-nearest candidates,
    /// nearest first.
    pub neighbor_ids: Vec<usize>,
}

/// Read-only nearest-neighbour index over "not a candidate" points.
#[derive(Debug)]
pub struct ProximityIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<GpsPoint>,
    neighbors: usize,
}

impl ProximityIndex {
    /// Build an index with the default 30 neighbours per query.
    pub fn build(visited: &[GpsPoint], excluded: &[GpsPoint]) -> Result<Self> {
        Self::with_neighbors(visited, excluded, DEFAULT_NEIGHBORS)
    }

    /// Build an index over the union of `visited` and `excluded`.
    ///
    /// Both sets mean the same thing here, so they are merged into one point
    /// cloud without weighting and duplicates are dropped. Fails with
    /// [`XploreError::InsufficientPoints`] when the cloud has fewer than
    /// `neighbors` points.
    pub fn with_neighbors(
        visited: &[GpsPoint],
        excluded: &[GpsPoint],
        neighbors: usize,
    ) -> Result<Self> {
        if neighbors == 0 {
            return Err(XploreError::InvalidConfig(
                "neighbors must be at least 1".to_string(),
            ));
        }

        let mut seen: HashSet<PointKey> = HashSet::with_capacity(visited.len() + excluded.len());
        let points: Vec<GpsPoint> = visited
            .iter()
            .chain(excluded.iter())
            .filter(|p| seen.insert(p.key()))
            .copied()
            .collect();

        if points.len() < neighbors {
            return Err(XploreError::InsufficientPoints {
                point_count: points.len(),
                minimum_required: neighbors,
            });
        }

        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint {
                idx,
                lat: p.latitude,
                lng: p.longitude,
            })
            .collect();
        let tree = RTree::bulk_load(indexed);

        info!(
            "proximity index over {} points ({} visited, {} excluded), k={}",
            points.len(),
            visited.len(),
            excluded.len(),
            neighbors
        );

        Ok(Self {
            tree,
            points,
            neighbors,
        })
    }

    /// Distance to the nearest indexed point, via `k` Euclidean candidates
    /// re-ranked by haversine distance.
    pub fn nearest_distance(&self, query: &GpsPoint) -> Nearest {
        let neighbor_ids: Vec<usize> = self
            .tree
            .nearest_neighbor_iter(&[query.latitude, query.longitude])
            .take(self.neighbors)
            .map(|p| p.idx)
            .collect();

        let distance_km = neighbor_ids
            .iter()
            .map(|&idx| haversine_km(query, &self.points[idx]))
            .fold(f64::INFINITY, f64::min);

        Nearest {
            distance_km,
            neighbor_ids,
        }
    }

    /// The merged point cloud, indexed by `Nearest::neighbor_ids`.
    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn point(&self, idx: usize) -> Option<&GpsPoint> {
        self.points.get(idx)
    }

    /// Neighbours retrieved per query.
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
