//! Map rendering of exploration results.
//!
//! Produces a self-contained Leaflet page (OpenStreetMap tiles) with a green
//! marker at the center, one marker per unexplored point, and the view fitted
//! to all of them. Points are also exportable as a GeoJSON FeatureCollection
//! for use in other tools.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::geo_utils::haversine_distance;
use crate::{Bounds, GpsPoint, Result};

const LEAFLET_VERSION: &str = "1.9.4";

/// A rendered map page.
#[derive(Debug, Clone)]
pub struct MapArtifact {
    /// Complete HTML document.
    pub html: String,
    /// Area the view is fitted to.
    pub bounds: Bounds,
}

impl MapArtifact {
    /// Write the HTML page to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.html)?;
        Ok(())
    }
}

/// Render `points` around `center` as a Leaflet map.
///
/// The view fits the bounds of all points, or just the center when there
/// are none. Markers are numbered in the order given.
pub fn render_map(center: GpsPoint, points: &[GpsPoint]) -> MapArtifact {
    let bounds = Bounds::from_points(points).unwrap_or_else(|| Bounds::from_corners(center, center));

    let markers: Vec<serde_json::Value> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "lat": p.latitude,
                "lng": p.longitude,
                "label": format!("#{} ({:.0} m)", i + 1, haversine_distance(&center, p)),
            })
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>xplore - {count} unexplored points</title>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{version}/dist/leaflet.css">
  <script src="https://unpkg.com/leaflet@{version}/dist/leaflet.js"></script>
  <style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
  <div id="map"></div>
  <script>
    var map = L.map('map').setView([{center_lat}, {center_lng}], 12);
    L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
      maxZoom: 19,
      attribution: '&copy; OpenStreetMap contributors'
    }}).addTo(map);
    L.circleMarker([{center_lat}, {center_lng}], {{color: 'green', radius: 9}})
      .bindPopup('center').addTo(map);
    var points = {markers};
    points.forEach(function (p) {{
      L.marker([p.lat, p.lng]).bindPopup(p.label).addTo(map);
    }});
    map.fitBounds([[{min_lat}, {min_lng}], [{max_lat}, {max_lng}]]);
  </script>
</body>
</html>
"#,
        count = points.len(),
        version = LEAFLET_VERSION,
        center_lat = center.latitude,
        center_lng = center.longitude,
        markers = serde_json::Value::Array(markers),
        min_lat = bounds.min_lat,
        min_lng = bounds.min_lng,
        max_lat = bounds.max_lat,
        max_lng = bounds.max_lng,
    );

    MapArtifact { html, bounds }
}

/// Write `points` as a GeoJSON FeatureCollection of Points.
///
/// Each feature carries its rank and distance from `center` in meters.
pub fn write_geojson(center: GpsPoint, points: &[GpsPoint], path: &Path) -> Result<()> {
    let features: Vec<serde_json::Value> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "type": "Feature",
                "properties": {
                    "rank": i + 1,
                    "distance_m": haversine_distance(&center, p).round(),
                },
                // GeoJSON order is [lng, lat]
                "geometry": {"type": "Point", "coordinates": [p.longitude, p.latitude]},
            })
        })
        .collect();

    let collection = json!({"type": "FeatureCollection", "features": features});

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(&collection)?)?;
    Ok(())
}
