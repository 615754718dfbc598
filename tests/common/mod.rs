//! Shared test fixtures.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use xplore::{GpsPoint, RoadsApi, SnappedPoint, XploreError};

/// Offset applied by `FakeRoads` when "snapping" a point (~11 m north).
pub const SNAP_OFFSET: f64 = 0.0001;

/// In-memory roads service.
///
/// Snaps every point `SNAP_OFFSET` degrees north, except points listed in
/// `off_road`. A batch containing `failing_point` fails with a 403.
pub struct FakeRoads {
    pub calls: AtomicUsize,
    pub batch_size: usize,
    pub max_parallel: usize,
    pub off_road: Vec<GpsPoint>,
    pub failing_point: Option<GpsPoint>,
}

impl FakeRoads {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            batch_size: 100,
            max_parallel: 1,
            off_road: Vec::new(),
            failing_point: None,
        }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoadsApi for FakeRoads {
    fn nearest_roads(&self, points: &[GpsPoint]) -> xplore::Result<Vec<SnappedPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failing) = self.failing_point {
            if points.contains(&failing) {
                return Err(XploreError::Api {
                    status: 403,
                    message: "The provided API key is invalid.".to_string(),
                });
            }
        }
        Ok(points
            .iter()
            .enumerate()
            .filter(|(_, p)| !self.off_road.contains(p))
            .map(|(i, p)| SnappedPoint {
                original_index: i,
                location: snapped(p),
            })
            .collect())
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

/// Where `FakeRoads` snaps `p` to.
pub fn snapped(p: &GpsPoint) -> GpsPoint {
    GpsPoint::new(p.latitude + SNAP_OFFSET, p.longitude)
}

/// `n` points along a line heading north-east from (40, -75).
pub fn line_points(n: usize) -> Vec<GpsPoint> {
    (0..n)
        .map(|i| GpsPoint::new(40.0 + i as f64 * 0.0001, -75.0 + i as f64 * 0.0001))
        .collect()
}

/// Write a zip archive with one file.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Takeout `Records.json` body for the given points, all at one timestamp.
pub fn takeout_json(points: &[GpsPoint]) -> String {
    let locations: Vec<String> = points
        .iter()
        .map(|p| {
            format!(
                r#"{{"latitudeE7": {}, "longitudeE7": {}, "timestamp": "2024-05-01T10:00:00Z"}}"#,
                p.to_e7()[0],
                p.to_e7()[1]
            )
        })
        .collect();
    format!(r#"{{"locations": [{}]}}"#, locations.join(","))
}
