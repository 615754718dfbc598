//! Points excluded from exploration.
//!
//! The exclusion file is an optional, hand-edited JSON document:
//!
//! ```json
//! {
//!   "private_points": [[40.01, -75.02]],
//!   "private_areas": [[[40.0, -75.0], [40.002, -74.997]]],
//!   "manual_visited_areas": [{"center": [40.1, -75.1], "radius_km": 0.3}]
//! }
//! ```
//!
//! Areas are filled with a grid at half the exploration spacing so that no
//! road point inside them can end up farther than the threshold from an
//! excluded point.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::grid::generate_grid;
use crate::{Area, GpsPoint, Result};

/// Contents of `excluded_from_exploration.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Individual points, e.g. home or work.
    pub private_points: Vec<GpsPoint>,
    /// Areas that should never be suggested.
    pub private_areas: Vec<Area>,
    /// Areas already explored without GPS history.
    pub manual_visited_areas: Vec<Area>,
}

impl ExclusionConfig {
    /// Load the exclusion file. A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Expand into the concrete excluded points.
    ///
    /// Literal points come first, followed by the grids of every private
    /// area and then every manual visited area.
    pub fn to_points(&self, grid_spacing_m: f64) -> Result<Vec<GpsPoint>> {
        let area_spacing_m = grid_spacing_m / 2.0;
        let mut points = self.private_points.clone();
        for area in self
            .private_areas
            .iter()
            .chain(self.manual_visited_areas.iter())
        {
            points.extend(generate_grid(area, area_spacing_m)?);
        }
        Ok(points)
    }

    pub fn is_empty(&self) -> bool {
        self.private_points.is_empty()
            && self.private_areas.is_empty()
            && self.manual_visited_areas.is_empty()
    }
}

/// Build the excluded point set from the optional file at `path`.
///
/// Returns an empty list when the file does not exist.
pub fn build_exclusions(path: &Path, grid_spacing_m: f64) -> Result<Vec<GpsPoint>> {
    let config = ExclusionConfig::load(path)?;
    if config.is_empty() {
        return Ok(Vec::new());
    }
    let points = config.to_points(grid_spacing_m)?;
    info!(
        "{} excluded points ({} private points, {} areas)",
        points.len(),
        config.private_points.len(),
        config.private_areas.len() + config.manual_visited_areas.len()
    );
    Ok(points)
}
