//! Station sources for the analog TV engine
//!
//! A source repaints a station's composite signal each frame:
//! - Bars: SMPTE colour bars with an optional keyed logo
//! - Image: a still picture, underscanned and fitted to the window
//! - Video: the latest frame pushed by a producer thread

mod bars;
mod error;
mod image;
mod video;

pub use bars::BarsSource;
pub use error::SourceError;
pub use image::ImageSource;
pub use video::{FrameSender, VideoSource};

use atv_core::StationSignal;

/// Anything that can drive a station.
#[derive(Debug)]
pub enum Source {
    ColorBars(BarsSource),
    StaticImage(ImageSource),
    Video(VideoSource),
}

impl Source {
    /// Repaint `station` with this source's current picture.
    pub fn update(&mut self, station: &mut StationSignal) {
        match self {
            Source::ColorBars(src) => src.update(station),
            Source::StaticImage(src) => src.update(station),
            Source::Video(src) => src.update(station),
        }
    }

    /// Native size of the source picture.
    pub fn image_size(&self) -> (usize, usize) {
        match self {
            Source::ColorBars(_) => BarsSource::DEFAULT_SIZE,
            Source::StaticImage(src) => src.image_size(),
            Source::Video(src) => src.image_size(),
        }
    }

    /// Size of the window the picture is composed for.
    pub fn set_out_size(&mut self, width: usize, height: usize) -> Result<(), SourceError> {
        match self {
            Source::ColorBars(src) => src.set_out_size(width, height),
            Source::StaticImage(src) => src.set_out_size(width, height),
            Source::Video(src) => src.set_out_size(width, height),
        }
    }

    /// Scramble sync on picture sources. Bars always carry clean sync.
    pub fn set_scrambled(&mut self, scrambled: bool) {
        match self {
            Source::ColorBars(_) => {}
            Source::StaticImage(src) => src.set_scrambled(scrambled),
            Source::Video(src) => src.set_scrambled(scrambled),
        }
    }
}

impl From<BarsSource> for Source {
    fn from(src: BarsSource) -> Self {
        Source::ColorBars(src)
    }
}

impl From<ImageSource> for Source {
    fn from(src: ImageSource) -> Self {
        Source::StaticImage(src)
    }
}

impl From<VideoSource> for Source {
    fn from(src: VideoSource) -> Self {
        Source::Video(src)
    }
}
