//! Error types for station sources

use atv_core::AtvError;
use thiserror::Error;

/// Errors that can occur while configuring a source
#[derive(Error, Debug, PartialEq)]
pub enum SourceError {
    #[error("Empty image ({width}x{height})")]
    EmptyImage { width: usize, height: usize },
    #[error("Invalid output size {width}x{height}")]
    InvalidOutputSize { width: usize, height: usize },
    #[error("Engine error: {0}")]
    Engine(#[from] AtvError),
}

pub(crate) fn check_image(image: &atv_core::Raster) -> Result<(), SourceError> {
    if image.is_empty() {
        return Err(SourceError::EmptyImage {
            width: image.width,
            height: image.height,
        });
    }
    Ok(())
}

pub(crate) fn check_out_size(width: usize, height: usize) -> Result<(), SourceError> {
    if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
        return Err(SourceError::InvalidOutputSize { width, height });
    }
    Ok(())
}
