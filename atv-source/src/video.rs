//! Moving pictures: the station shows the latest frame pushed by a producer

use std::sync::Arc;

use atv_core::{Raster, StationSignal};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{check_image, check_out_size, SourceError};
use crate::image::{draw_fitted, fit};

/// Handle a decoder thread uses to hand frames to a [`VideoSource`].
///
/// Only the newest frame is kept; frames pushed faster than the source
/// updates are dropped.
#[derive(Debug, Clone, Default)]
pub struct FrameSender {
    slot: Arc<Mutex<Option<Raster>>>,
}

impl FrameSender {
    pub fn push(&self, frame: Raster) -> Result<(), SourceError> {
        check_image(&frame)?;
        *self.slot.lock() = Some(frame);
        Ok(())
    }

    /// Push a raw RGBA buffer.
    pub fn push_rgba(&self, width: usize, height: usize, data: Vec<u8>) -> Result<(), SourceError> {
        self.push(Raster::from_raw(width, height, data)?)
    }
}

#[derive(Debug, Default)]
pub struct VideoSource {
    sender: FrameSender,
    current: Option<Raster>,
    out_size: Option<(usize, usize)>,
    scrambled: bool,
    frames_shown: u64,
}

impl VideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> FrameSender {
        self.sender.clone()
    }

    /// Size of the frame on screen, zero before the first frame.
    pub fn image_size(&self) -> (usize, usize) {
        self.current
            .as_ref()
            .map_or((0, 0), |frame| (frame.width, frame.height))
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// Window size; defaults to each frame's own size.
    pub fn set_out_size(&mut self, width: usize, height: usize) -> Result<(), SourceError> {
        check_out_size(width, height)?;
        self.out_size = Some((width, height));
        Ok(())
    }

    pub fn set_scrambled(&mut self, scrambled: bool) {
        self.scrambled = scrambled;
    }

    /// Take the newest pushed frame, if any, and encode the current one.
    ///
    /// Until a frame arrives the station carries sync over black.
    pub fn update(&mut self, station: &mut StationSignal) {
        let pushed = self.sender.slot.lock().take();
        if let Some(frame) = pushed {
            if self.image_size() != (frame.width, frame.height) {
                debug!(width = frame.width, height = frame.height, "video frame size");
            }
            self.current = Some(frame);
            self.frames_shown += 1;
        }

        let Some(frame) = &self.current else {
            trace!("no video frame yet");
            station.setup_sync(true, self.scrambled);
            return;
        };
        let out_size = self.out_size.unwrap_or((frame.width, frame.height));
        let fitted = fit(frame, out_size.0, out_size.1);
        draw_fitted(station, frame, fitted, out_size, self.scrambled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atv_core::geometry::{BLACK_LEVEL, PIC_LEN, PIC_START, TOP};
    use atv_core::AtvError;

    fn centre(st: &StationSignal) -> i32 {
        st.line(TOP + 100)[PIC_START + PIC_LEN / 2] as i32
    }

    #[test]
    fn test_black_until_first_frame() {
        let mut src = VideoSource::new();
        let mut st = StationSignal::new();
        src.update(&mut st);
        assert_eq!(centre(&st), BLACK_LEVEL);
        assert_eq!(src.image_size(), (0, 0));
    }

    #[test]
    fn test_shows_latest_frame() {
        let mut src = VideoSource::new();
        src.set_out_size(320, 240).unwrap();
        let tx = src.sender();
        tx.push(Raster::filled(32, 24, [0, 0, 0])).unwrap();
        tx.push(Raster::filled(32, 24, [255, 255, 255])).unwrap();

        let mut st = StationSignal::new();
        src.update(&mut st);
        assert!(centre(&st) > 80);
        assert_eq!(src.frames_shown(), 1);

        // Nothing new: keep showing the last frame
        src.update(&mut st);
        assert!(centre(&st) > 80);
        assert_eq!(src.frames_shown(), 1);
    }

    #[test]
    fn test_push_from_another_thread() {
        let mut src = VideoSource::new();
        let tx = src.sender();
        std::thread::spawn(move || tx.push(Raster::filled(16, 12, [255, 255, 255])))
            .join()
            .unwrap()
            .unwrap();

        let mut st = StationSignal::new();
        src.update(&mut st);
        assert_eq!(src.image_size(), (16, 12));
    }

    #[test]
    fn test_push_rgba_checks_length() {
        let src = VideoSource::new();
        let err = src.sender().push_rgba(4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(err, SourceError::Engine(AtvError::RasterSize { .. })));
        assert!(src.sender().push_rgba(2, 2, vec![255; 16]).is_ok());
    }
}
