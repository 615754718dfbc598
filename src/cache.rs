//! Grid-to-road cache.
//!
//! Every grid point ever sent to the roads service is recorded together with
//! the road point it snapped to (or `null` when the service found no road
//! near it). The two arrays are index-aligned and only ever grow, so a run
//! pays only for grid points it has never queried before.
//!
//! Grid points are stored as E7 integers: comparing freshly generated
//! points at E7 precision is immune to float formatting round trips.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{GpsPoint, Result, XploreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(rename = "grid_points_E7")]
    grid_points_e7: Vec<[i64; 2]>,
    road_points: Vec<Option<GpsPoint>>,
}

/// Persistent mapping from queried grid points to snapped road points.
#[derive(Debug)]
pub struct GridCache {
    path: PathBuf,
    grid_points_e7: Vec<[i64; 2]>,
    road_points: Vec<Option<GpsPoint>>,
    known: HashSet<[i64; 2]>,
}

impl GridCache {
    /// Empty cache that will be saved at `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            grid_points_e7: Vec::new(),
            road_points: Vec::new(),
            known: HashSet::new(),
        }
    }

    /// Load the cache at `path`, or start empty when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(path));
        }
        let content = fs::read_to_string(path)?;
        let file: CacheFile = serde_json::from_str(&content)?;
        if file.grid_points_e7.len() != file.road_points.len() {
            return Err(XploreError::CacheCorrupt {
                path: path.to_path_buf(),
                grid_len: file.grid_points_e7.len(),
                road_len: file.road_points.len(),
            });
        }

        let known = file.grid_points_e7.iter().copied().collect();
        info!(
            "have {} cached grid points ({} on roads)",
            file.grid_points_e7.len(),
            file.road_points.iter().flatten().count()
        );
        Ok(Self {
            path: path.to_path_buf(),
            grid_points_e7: file.grid_points_e7,
            road_points: file.road_points,
            known,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of grid points queried so far.
    pub fn len(&self) -> usize {
        self.grid_points_e7.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid_points_e7.is_empty()
    }

    /// Whether `grid_point` was already sent to the roads service.
    pub fn contains(&self, grid_point: &GpsPoint) -> bool {
        self.known.contains(&grid_point.to_e7())
    }

    /// Grid points from `grid` that have never been queried, in order.
    pub fn missing(&self, grid: &[GpsPoint]) -> Vec<GpsPoint> {
        let mut pending = HashSet::new();
        grid.iter()
            .filter(|p| {
                let e7 = p.to_e7();
                !self.known.contains(&e7) && pending.insert(e7)
            })
            .copied()
            .collect()
    }

    /// Record the outcome of querying `grid_point`.
    ///
    /// Re-recording an already cached grid point is ignored so the arrays
    /// never hold duplicates.
    pub fn record(&mut self, grid_point: GpsPoint, road_point: Option<GpsPoint>) {
        let e7 = grid_point.to_e7();
        if self.known.insert(e7) {
            self.grid_points_e7.push(e7);
            self.road_points.push(road_point);
        }
    }

    /// Cached grid points (E7) and their road points, index-aligned.
    pub fn entries(&self) -> impl Iterator<Item = ([i64; 2], Option<GpsPoint>)> + '_ {
        self.grid_points_e7
            .iter()
            .copied()
            .zip(self.road_points.iter().copied())
    }

    /// Road point cached for `grid_point`, if it was queried and snapped.
    pub fn road_point_for(&self, grid_point: &GpsPoint) -> Option<GpsPoint> {
        let e7 = grid_point.to_e7();
        self.entries()
            .find(|(g, _)| *g == e7)
            .and_then(|(_, road)| road)
    }

    /// All snapped road points (unsnapped grid points are skipped).
    pub fn road_points(&self) -> Vec<GpsPoint> {
        self.road_points.iter().flatten().copied().collect()
    }

    /// Road points for the grid points of `grid` only.
    pub fn road_points_for(&self, grid: &[GpsPoint]) -> Vec<GpsPoint> {
        let wanted: HashSet<[i64; 2]> = grid.iter().map(GpsPoint::to_e7).collect();
        self.entries()
            .filter(|(g, _)| wanted.contains(g))
            .filter_map(|(_, road)| road)
            .collect()
    }

    /// Write the cache to disk through a temporary file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CacheFile {
            grid_points_e7: self.grid_points_e7.clone(),
            road_points: self.road_points.clone(),
        };
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&file)?)?;
        fs::rename(&tmp, &self.path)?;
        info!(
            "saved {} grid points to {}",
            self.grid_points_e7.len(),
            self.path.display()
        );
        Ok(())
    }
}
