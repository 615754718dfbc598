//! Road snapping.
//!
//! Grid points are sent to a roads service in fixed-size batches and mapped
//! to the nearest road coordinate. Every run first checks how many batches
//! it would need against the caller's request budget and refuses to start
//! when the budget is too small, so a misconfigured area cannot run up an
//! API bill.
//!
//! Batches are independent. With the `parallel` feature they run on a small
//! dedicated rayon pool; results are always merged into the [`GridCache`] on
//! the calling thread.

use log::{debug, info, warn};

use crate::cache::GridCache;
use crate::progress::SnapProgress;
use crate::{GpsPoint, Result, XploreError};

/// Largest batch the Google Roads API accepts.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A road coordinate returned for one point of a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedPoint {
    /// Index of the query point within its batch.
    pub original_index: usize,
    /// Coordinate on the road.
    pub location: GpsPoint,
}

/// A service that snaps points to nearby roads.
pub trait RoadsApi: Sync {
    /// Snap one batch of points. Points with no nearby road are simply absent
    /// from the result.
    fn nearest_roads(&self, points: &[GpsPoint]) -> Result<Vec<SnappedPoint>>;

    /// Maximum points per request.
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Requests allowed in flight at once.
    fn max_parallel(&self) -> usize {
        1
    }
}

/// Number of requests needed to snap `point_count` points.
pub fn required_requests(point_count: usize, batch_size: usize) -> usize {
    point_count.div_ceil(batch_size)
}

/// Snap `points` to roads using at most `max_requests` requests.
///
/// Returns every input point paired with its road point (`None` when the
/// service found no road). Fails before any request with
/// [`XploreError::BudgetExceeded`] if the budget is too small, and with the
/// first batch error if any request fails.
pub fn snap_to_roads(
    api: &dyn RoadsApi,
    points: &[GpsPoint],
    max_requests: usize,
    progress: &dyn SnapProgress,
) -> Result<Vec<(GpsPoint, Option<GpsPoint>)>> {
    let outcomes = snap_batches(api, points, max_requests, progress)?;
    let mut snapped = Vec::with_capacity(points.len());
    for (batch, outcome) in outcomes {
        let roads = outcome?;
        snapped.extend(batch.iter().copied().zip(roads));
    }
    Ok(snapped)
}

/// Query every grid point missing from `cache` and record the results.
///
/// Results of successful batches are recorded and saved even when another
/// batch fails, so the spend is never lost; the first failure is then
/// returned. Failed batches are never cached. Returns the number of newly
/// queried grid points.
pub fn update_grid_cache(
    api: &dyn RoadsApi,
    cache: &mut GridCache,
    grid: &[GpsPoint],
    max_requests: usize,
    progress: &dyn SnapProgress,
) -> Result<usize> {
    let missing = cache.missing(grid);
    info!("needs {} points to be mapped to roads", missing.len());
    if missing.is_empty() {
        return Ok(0);
    }

    let outcomes = snap_batches(api, &missing, max_requests, progress)?;

    let mut recorded = 0;
    let mut first_error = None;
    for (batch, outcome) in outcomes {
        match outcome {
            Ok(roads) => {
                for (grid_point, road_point) in batch.iter().zip(roads) {
                    cache.record(*grid_point, road_point);
                }
                recorded += batch.len();
            }
            Err(e) => {
                warn!("batch of {} points failed: {}", batch.len(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if recorded > 0 {
        cache.save()?;
    }
    info!(
        "after mapping have {} grid points and {} road points",
        cache.len(),
        cache.road_points().len()
    );

    match first_error {
        Some(e) => Err(e),
        None => Ok(recorded),
    }
}

type BatchOutcome<'a> = (&'a [GpsPoint], Result<Vec<Option<GpsPoint>>>);

fn snap_batches<'a>(
    api: &dyn RoadsApi,
    points: &'a [GpsPoint],
    max_requests: usize,
    progress: &dyn SnapProgress,
) -> Result<Vec<BatchOutcome<'a>>> {
    let batch_size = api.batch_size();
    if batch_size == 0 {
        return Err(XploreError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }

    let required = required_requests(points.len(), batch_size);
    if required > max_requests {
        return Err(XploreError::BudgetExceeded {
            required,
            budget: max_requests,
        });
    }

    let batches: Vec<&[GpsPoint]> = points.chunks(batch_size).collect();
    progress.on_start(batches.len());

    let run = |batch: &'a [GpsPoint]| -> BatchOutcome<'a> {
        let outcome = snap_batch(api, batch);
        progress.on_batch_done();
        (batch, outcome)
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<BatchOutcome<'a>> = {
        use rayon::prelude::*;

        let threads = api.max_parallel().max(1);
        if threads == 1 || batches.len() == 1 {
            batches.into_iter().map(run).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| XploreError::InvalidConfig(format!("thread pool: {e}")))?;
            pool.install(|| batches.into_par_iter().map(run).collect())
        }
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<BatchOutcome<'a>> = batches.into_iter().map(run).collect();

    Ok(outcomes)
}

/// Query one batch and align the answer with the batch's points.
///
/// When the service returns several road points for one query point, the
/// last one wins.
fn snap_batch(api: &dyn RoadsApi, batch: &[GpsPoint]) -> Result<Vec<Option<GpsPoint>>> {
    let snapped = api.nearest_roads(batch)?;
    let mut roads = vec![None; batch.len()];
    for s in snapped {
        match roads.get_mut(s.original_index) {
            Some(slot) => *slot = Some(s.location),
            None => warn!(
                "ignoring snapped point with index {} outside batch of {}",
                s.original_index,
                batch.len()
            ),
        }
    }
    debug!(
        "batch of {} points: {} on roads",
        batch.len(),
        roads.iter().flatten().count()
    );
    Ok(roads)
}
