//! Google Roads API client.
//!
//! Calls the `nearestRoads` endpoint with up to 100 `lat,lon` points per
//! request. Each request has a timeout; timeouts, connection failures, 429
//! and 5xx responses are retried with exponential back-off and jitter. Any
//! other non-success response is returned as [`XploreError::Api`] and never
//! treated as "no roads here".

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::RoadsClientConfig;
use crate::roads::{RoadsApi, SnappedPoint};
use crate::{GpsPoint, Result, XploreError};

const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NearestRoadsResponse {
    #[serde(default)]
    snapped_points: Vec<ApiSnappedPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSnappedPoint {
    location: ApiLocation,
    original_index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Blocking client for the Google Roads `nearestRoads` endpoint.
pub struct GoogleRoadsClient {
    client: Client,
    api_key: String,
    config: RoadsClientConfig,
}

impl GoogleRoadsClient {
    /// Creates a client with the given API key and settings.
    pub fn new(api_key: &str, config: RoadsClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("xplore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            config,
        })
    }

    fn request_once(&self, points: &str) -> Result<Vec<SnappedPoint>> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("points", points), ("key", self.api_key.as_str())])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        parse_nearest_roads(&body)
    }
}

impl RoadsApi for GoogleRoadsClient {
    fn nearest_roads(&self, points: &[GpsPoint]) -> Result<Vec<SnappedPoint>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let query = format_points(points);
        retry_with_backoff(self.config.max_retries, self.config.backoff_base_ms, || {
            self.request_once(&query)
        })
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn max_parallel(&self) -> usize {
        self.config.max_parallel
    }
}

/// Format points as the `points` query parameter: `lat,lon|lat,lon|...`.
pub fn format_points(points: &[GpsPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.latitude, p.longitude))
        .collect::<Vec<_>>()
        .join("|")
}

/// Parse a successful `nearestRoads` body.
pub fn parse_nearest_roads(body: &str) -> Result<Vec<SnappedPoint>> {
    let response: NearestRoadsResponse = serde_json::from_str(body)?;
    Ok(response
        .snapped_points
        .into_iter()
        .map(|p| SnappedPoint {
            original_index: p.original_index,
            location: GpsPoint::new(p.location.latitude, p.location.longitude),
        })
        .collect())
}

fn api_error(status: StatusCode, body: &str) -> XploreError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    XploreError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Whether `err` is worth retrying after a delay.
///
/// Retriable: timeouts, connection failures, 429 and 5xx. Everything else
/// (bad key, malformed request, unparseable body) is returned immediately.
pub(crate) fn is_retriable(err: &XploreError) -> bool {
    match err {
        XploreError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        XploreError::Api { status, .. } => *status == 429 || (500..600).contains(status),
        _ => false,
    }
}

/// Delay before retry number `attempt` (1-based): `base × 2^(attempt-1)`,
/// capped at one minute, with ±25% jitter.
pub(crate) fn backoff_delay(attempt: u32, backoff_base_ms: u64) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    let jittered = capped as f64 * (rand::random::<f64>() * 0.5 + 0.75);
    Duration::from_millis(jittered as u64)
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
pub(crate) fn retry_with_backoff<T, F>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0u32;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(attempt, backoff_base_ms);
                warn!(
                    "roads API transient error, retry {}/{} in {}ms: {}",
                    attempt,
                    max_retries,
                    delay.as_millis(),
                    err
                );
                thread::sleep(delay);
                debug!("retrying roads API request");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_format_points() {
        let points = vec![GpsPoint::new(40.0, -75.5), GpsPoint::new(40.25, -75.0)];
        assert_eq!(format_points(&points), "40,-75.5|40.25,-75");
    }

    #[test]
    fn test_parse_nearest_roads() {
        let body = r#"{
            "snappedPoints": [
                {"location": {"latitude": 40.001, "longitude": -75.002}, "originalIndex": 1, "placeId": "a"},
                {"location": {"latitude": 40.003, "longitude": -75.004}, "originalIndex": 0, "placeId": "b"}
            ]
        }"#;
        let snapped = parse_nearest_roads(body).unwrap();
        assert_eq!(snapped.len(), 2);
        assert_eq!(snapped[0].original_index, 1);
        assert_eq!(snapped[0].location, GpsPoint::new(40.001, -75.002));
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_nearest_roads("{}").unwrap().is_empty());
    }

    #[test]
    fn test_api_error_message_extracted() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        match api_error(StatusCode::FORBIDDEN, body) {
            XploreError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_retriable_statuses() {
        let api = |status| XploreError::Api {
            status,
            message: String::new(),
        };
        assert!(is_retriable(&api(429)));
        assert!(is_retriable(&api(503)));
        assert!(!is_retriable(&api(400)));
        assert!(!is_retriable(&api(403)));
        assert!(!is_retriable(&XploreError::BudgetExceeded {
            required: 2,
            budget: 1
        }));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let delay = backoff_delay(30, 1_000);
        assert!(delay <= Duration::from_millis(MAX_DELAY_MS * 5 / 4));
        let first = backoff_delay(1, 100);
        assert!(first >= Duration::from_millis(75) && first <= Duration::from_millis(125));
    }

    #[test]
    fn test_retry_stops_on_permanent_error() {
        let calls = Cell::new(0);
        let result: Result<()> = retry_with_backoff(3, 1, || {
            calls.set(calls.get() + 1);
            Err(XploreError::Api {
                status: 400,
                message: "bad request".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retry_recovers_from_transient_error() {
        let calls = Cell::new(0);
        let result = retry_with_backoff(3, 1, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(XploreError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                })
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }
}
