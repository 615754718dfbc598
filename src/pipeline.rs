//! End-to-end exploration run.
//!
//! 1. Visited points: newest takeout and GPX folder merged into the rolling
//!    history, which is then used as a whole
//! 2. Excluded points from the optional exclusion file
//! 3. Proximity index over both (fails fast, before any API spend)
//! 4. Disk grid around the center, snapped to roads through the cache
//! 5. Gap detection

use log::info;

use crate::cache::GridCache;
use crate::exclusions::build_exclusions;
use crate::gaps::find_unexplored;
use crate::grid::generate_disk_grid;
use crate::history::{find_takeout, load_gpx_dir, load_takeout_zip, RollingHistory};
use crate::index::ProximityIndex;
use crate::progress::SnapProgress;
use crate::roads::{update_grid_cache, RoadsApi};
use crate::{ExploreConfig, GpsPoint, Result};

/// Outcome of one exploration run.
#[derive(Debug, Clone)]
pub struct ExplorationResult {
    /// Unexplored road points, nearest to the center first.
    pub unexplored: Vec<GpsPoint>,
    pub visited_count: usize,
    pub excluded_count: usize,
    pub grid_count: usize,
    pub road_count: usize,
    /// Grid points sent to the roads service during this run.
    pub newly_snapped: usize,
}

/// Collect visited points and fold new ones into the rolling history.
///
/// Sources are the newest takeout archive in `takeouts/` and the GPX files
/// in `gpx/`, both optional. Returns the whole rolling history.
pub fn load_visited(config: &ExploreConfig) -> Result<Vec<GpsPoint>> {
    let mut rolling = RollingHistory::load(&config.rolling_history_path())?;
    info!("rolling history has {} points", rolling.len());

    let mut fresh: Vec<GpsPoint> = Vec::new();
    match find_takeout(&config.takeouts_dir())? {
        Some(zip_path) => {
            fresh.extend(load_takeout_zip(&zip_path)?.into_iter().map(|r| r.point));
        }
        None => info!(
            "no takeout archive in {}, skipping",
            config.takeouts_dir().display()
        ),
    }
    let gpx_dir = config.gpx_dir();
    if gpx_dir.is_dir() {
        fresh.extend(load_gpx_dir(&gpx_dir)?);
    }

    if !fresh.is_empty() {
        rolling.merge_and_save(&fresh)?;
    }
    Ok(rolling.points().to_vec())
}

/// Run the whole pipeline against `api`.
pub fn run_exploration(
    config: &ExploreConfig,
    api: &dyn RoadsApi,
    progress: &dyn SnapProgress,
) -> Result<ExplorationResult> {
    config.validate()?;

    let visited = load_visited(config)?;
    let excluded = build_exclusions(&config.exclusions_path(), config.grid_spacing_m)?;
    let index = ProximityIndex::with_neighbors(&visited, &excluded, config.neighbors)?;

    let grid = generate_disk_grid(config.center, config.radius_km, config.grid_spacing_m)?;
    info!(
        "grid from {:?} with radius {} km and spacing {} m has {} points",
        config.center,
        config.radius_km,
        config.grid_spacing_m,
        grid.len()
    );

    let mut cache = GridCache::load(&config.grid_cache_path())?;
    let newly_snapped = update_grid_cache(api, &mut cache, &grid, config.max_requests, progress)?;
    let roads = cache.road_points_for(&grid);

    let unexplored = find_unexplored(
        &index,
        &roads,
        config.center,
        config.radius_km,
        config.grid_spacing_m,
    );

    Ok(ExplorationResult {
        unexplored,
        visited_count: visited.len(),
        excluded_count: excluded.len(),
        grid_count: grid.len(),
        road_count: roads.len(),
        newly_snapped,
    })
}
