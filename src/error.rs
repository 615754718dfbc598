//! Unified error type for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, XploreError>;

/// Errors returned by xplore.
#[derive(Debug, Error)]
pub enum XploreError {
    /// The proximity index needs at least as many points as neighbours queried.
    #[error("insufficient points: {point_count} points, need at least {minimum_required}")]
    InsufficientPoints {
        point_count: usize,
        minimum_required: usize,
    },

    /// An area needs more grid steps than allowed along one axis.
    #[error("area looks too large: more than {max_steps} {axis} steps needed")]
    AreaTooLarge { axis: &'static str, max_steps: usize },

    /// Road snapping would need more API batches than the caller allowed.
    #[error("{required} API requests required, budget is {budget}")]
    BudgetExceeded { required: usize, budget: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Grid cache arrays are not index-aligned.
    #[error("grid cache {path} is corrupt: {grid_len} grid points but {road_len} road points")]
    CacheCorrupt {
        path: PathBuf,
        grid_len: usize,
        road_len: usize,
    },

    /// The roads service answered with a non-success response.
    #[error("roads API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no takeout archive found in {0}")]
    NoTakeout(PathBuf),

    #[error("no location records found in {0}")]
    NoLocationRecords(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to parse GPX file {path}: {source}")]
    Gpx {
        path: PathBuf,
        #[source]
        source: gpx::errors::GpxError,
    },

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
