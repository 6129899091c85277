//! Error types for the analog TV engine

use thiserror::Error;

/// Errors raised while building engine inputs.
///
/// Per-frame operations never fail; these cover construction of
/// rasters and control sets from caller-provided data.
#[derive(Error, Debug, PartialEq)]
pub enum AtvError {
    #[error("Raster buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    RasterSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid value for control '{key}': {value}")]
    InvalidControl { key: String, value: String },
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}
