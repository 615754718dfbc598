//! Run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::index::DEFAULT_NEIGHBORS;
use crate::{GpsPoint, Result, XploreError};

/// Configuration for one exploration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Center of the area of interest.
    pub center: GpsPoint,

    /// Radius around `center` to search for unexplored roads.
    /// Default: 5.0 km
    pub radius_km: f64,

    /// Distance between grid points, also the "already visited" threshold.
    /// Default: 100.0 meters
    pub grid_spacing_m: f64,

    /// Maximum number of Roads API requests allowed in one run.
    /// Default: 50
    pub max_requests: usize,

    /// Neighbours retrieved per proximity query before exact re-ranking.
    /// Default: 30
    pub neighbors: usize,

    /// Directory holding takeouts, exclusions, caches and rolling history.
    /// Default: "data"
    pub data_dir: PathBuf,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            center: GpsPoint::new(0.0, 0.0),
            radius_km: 5.0,
            grid_spacing_m: 100.0,
            max_requests: 50,
            neighbors: DEFAULT_NEIGHBORS,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ExploreConfig {
    /// Create a configuration around `center` with default settings.
    pub fn around(center: GpsPoint) -> Self {
        Self {
            center,
            ..Self::default()
        }
    }

    /// Reject settings no run can succeed with.
    pub fn validate(&self) -> Result<()> {
        if !self.center.is_valid() {
            return Err(XploreError::InvalidConfig(format!(
                "center {:?} is not a valid coordinate",
                self.center
            )));
        }
        if !(self.radius_km > 0.0) {
            return Err(XploreError::InvalidConfig(format!(
                "radius_km must be positive, got {}",
                self.radius_km
            )));
        }
        if !(self.grid_spacing_m > 0.0) {
            return Err(XploreError::InvalidConfig(format!(
                "grid_spacing_m must be positive, got {}",
                self.grid_spacing_m
            )));
        }
        if self.neighbors == 0 {
            return Err(XploreError::InvalidConfig(
                "neighbors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Folder scanned for Google Takeout archives.
    pub fn takeouts_dir(&self) -> PathBuf {
        self.data_dir.join("takeouts")
    }

    /// Folder scanned for GPX files.
    pub fn gpx_dir(&self) -> PathBuf {
        self.data_dir.join("gpx")
    }

    /// Optional exclusion file.
    pub fn exclusions_path(&self) -> PathBuf {
        self.data_dir.join("excluded_from_exploration.json")
    }

    /// Rolling history file.
    pub fn rolling_history_path(&self) -> PathBuf {
        self.data_dir.join("rolling_history.json")
    }

    /// Grid cache file for this center, radius and spacing.
    pub fn grid_cache_path(&self) -> PathBuf {
        grid_cache_path(
            &self.data_dir,
            self.center,
            self.radius_km,
            self.grid_spacing_m,
        )
    }
}

/// Cache file path keyed by center, radius and spacing.
///
/// Center coordinates always carry a decimal point (`40.0`), radius and
/// spacing only when they are fractional (`5`, `1.5`), so files written by
/// earlier tooling for the same parameters are found again.
pub fn grid_cache_path(data_dir: &Path, center: GpsPoint, radius_km: f64, spacing_m: f64) -> PathBuf {
    data_dir.join("grid_to_road_cache").join(format!(
        "grid_to_road_cache_center_{:?}_{:?}_radius_{}_spacing_{}.json",
        center.latitude, center.longitude, radius_km, spacing_m
    ))
}

/// Settings for talking to the roads service.
#[derive(Debug, Clone)]
pub struct RoadsClientConfig {
    /// Service endpoint (overridable for tests).
    pub base_url: String,

    /// Points per request. The Google Roads API accepts at most 100.
    pub batch_size: usize,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure.
    pub max_retries: u32,

    /// Base back-off delay, doubled on each retry.
    pub backoff_base_ms: u64,

    /// Batches in flight at once (`parallel` feature only).
    pub max_parallel: usize,
}

impl Default for RoadsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://roads.googleapis.com/v1/nearestRoads".to_string(),
            batch_size: 100,
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 1_000,
            max_parallel: 4,
        }
    }
}
