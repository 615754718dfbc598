//! Location history sources.
//!
//! Visited points come from:
//! - Google Takeout archives (`Records.json`-style files with a top-level
//!   `locations` list of E7 coordinates)
//! - Folders of GPX files
//! - A rolling history file that accumulates points across takeouts, so
//!   history survives even when older exports are deleted
//!
//! Points are deduplicated on exact coordinates. Records with missing or
//! non-finite coordinates are dropped.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::{dedup_points, GpsPoint, PointKey, Result, XploreError};

/// One location record with its (optional) timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRecord {
    pub point: GpsPoint,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TakeoutRoot {
    locations: Option<Vec<serde_json::Value>>,
}

/// One `locations` entry. Timestamps stay untyped so a malformed timestamp
/// only costs the record its timestamp.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TakeoutLocation {
    latitude_e7: Option<f64>,
    longitude_e7: Option<f64>,
    timestamp: Option<serde_json::Value>,
    timestamp_ms: Option<serde_json::Value>,
}

impl TakeoutLocation {
    /// Parse one raw entry. Entries with mistyped coordinates yield `None`.
    fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    fn into_record(self) -> Option<HistoryRecord> {
        let point = GpsPoint::new(self.latitude_e7? / 1e7, self.longitude_e7? / 1e7);
        if !point.is_valid() {
            return None;
        }
        let timestamp = self
            .timestamp
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .or_else(|| {
                let ms = match self.timestamp_ms.as_ref()? {
                    serde_json::Value::String(s) => s.parse::<i64>().ok()?,
                    serde_json::Value::Number(n) => n.as_i64()?,
                    _ => return None,
                };
                Utc.timestamp_millis_opt(ms).single()
            });
        Some(HistoryRecord { point, timestamp })
    }
}

/// Keep one record per exact coordinate: the one with the latest timestamp.
///
/// Records without a timestamp lose to any timestamped duplicate. Output
/// follows the order in which coordinates were first seen.
pub fn dedup_latest(records: impl IntoIterator<Item = HistoryRecord>) -> Vec<HistoryRecord> {
    let mut position: HashMap<PointKey, usize> = HashMap::new();
    let mut unique: Vec<HistoryRecord> = Vec::new();

    for record in records {
        match position.get(&record.point.key()) {
            Some(&i) => {
                if record.timestamp > unique[i].timestamp {
                    unique[i] = record;
                }
            }
            None => {
                position.insert(record.point.key(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

/// Read unique location records from a Takeout zip archive.
///
/// The first `.json` member with a top-level `locations` list is used.
pub fn load_takeout_zip(zip_path: &Path) -> Result<Vec<HistoryRecord>> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.name().ends_with("json") {
            continue;
        }
        let name = entry.name().to_string();
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;

        let root: TakeoutRoot = match serde_json::from_slice(&content) {
            Ok(root) => root,
            Err(e) => {
                debug!("skipping {name}: {e}");
                continue;
            }
        };
        let Some(locations) = root.locations else {
            continue;
        };

        info!("{}: {} location records in {}", zip_path.display(), locations.len(), name);
        let total = locations.len();
        let records = dedup_latest(
            locations
                .into_iter()
                .filter_map(TakeoutLocation::from_value)
                .filter_map(TakeoutLocation::into_record),
        );
        info!("read {} unique locations ({} records)", records.len(), total);
        return Ok(records);
    }

    Err(XploreError::NoLocationRecords(zip_path.to_path_buf()))
}

/// Read the newest Takeout archive found in `takeouts_dir`.
pub fn load_takeout_dir(takeouts_dir: &Path) -> Result<Vec<HistoryRecord>> {
    let zip_path = find_takeout(takeouts_dir)?
        .ok_or_else(|| XploreError::NoTakeout(takeouts_dir.to_path_buf()))?;
    load_takeout_zip(&zip_path)
}

/// Newest `.zip` file in `dir`, if the directory exists and has one.
///
/// Takeout names its exports `takeout-YYYYMMDDTHHMMSSZ-NNN.zip`, so the
/// last file name in sorted order is the most recent export.
pub fn find_takeout(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut zips: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "zip"))
        .collect();
    zips.sort();
    Ok(zips.pop())
}

/// Load every track, route and waypoint position from `.gpx` files in `folder`.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_gpx_dir(folder: &Path) -> Result<Vec<GpsPoint>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "gpx"))
        .collect();
    paths.sort();

    let mut points = Vec::new();
    for path in &paths {
        match parse_gpx_file(path) {
            Ok(mut file_points) => {
                debug!("{}: {} points", path.display(), file_points.len());
                points.append(&mut file_points);
            }
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }

    let unique = dedup_points(&points);
    info!(
        "read {} unique points from {} GPX files",
        unique.len(),
        paths.len()
    );
    Ok(unique)
}

/// Parse a single GPX file into valid points.
pub fn parse_gpx_file(path: &Path) -> Result<Vec<GpsPoint>> {
    let file = File::open(path)?;
    let gpx = gpx::read(BufReader::new(file)).map_err(|source| XploreError::Gpx {
        path: path.to_path_buf(),
        source,
    })?;

    let track_points = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|s| s.points.iter());
    let route_points = gpx.routes.iter().flat_map(|r| r.points.iter());

    Ok(track_points
        .chain(route_points)
        .chain(gpx.waypoints.iter())
        .map(|wpt| {
            let p = wpt.point();
            GpsPoint::new(p.y(), p.x())
        })
        .filter(GpsPoint::is_valid)
        .collect())
}

/// Accumulated history persisted as a JSON array of `[lat, lon]` pairs.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    path: PathBuf,
    points: Vec<GpsPoint>,
}

impl RollingHistory {
    /// Load the rolling history at `path`. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        let points = if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            points,
        })
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append points not yet in the history, in their given order.
    ///
    /// Returns how many points were added.
    pub fn merge(&mut self, new_points: &[GpsPoint]) -> usize {
        let mut known: std::collections::HashSet<PointKey> =
            self.points.iter().map(GpsPoint::key).collect();
        let before = self.points.len();
        for p in new_points {
            if known.insert(p.key()) {
                self.points.push(*p);
            }
        }
        self.points.len() - before
    }

    /// Write the history back, keeping a `.bak` copy of the previous file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&self.points)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Merge `new_points` and persist when anything was added.
    pub fn merge_and_save(&mut self, new_points: &[GpsPoint]) -> Result<usize> {
        let added = self.merge(new_points);
        if added > 0 {
            self.save()?;
        }
        info!(
            "rolling history: {} new points, {} total",
            added,
            self.points.len()
        );
        Ok(added)
    }

    /// Location of the backup written before each save.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".bak");
        self.path.with_file_name(name)
    }
}
