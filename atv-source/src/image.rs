//! Still images, underscanned and fitted to the window aspect

use atv_core::{Placement, Raster, StationSignal};

use crate::error::{check_image, check_out_size, SourceError};

/// Share of the fitted width and height the picture fills, leaving a
/// border a real set would hide in overscan.
const UNDERSCAN_X: f64 = 0.815;
const UNDERSCAN_Y: f64 = 0.970;

/// Largest size with the image's aspect ratio that fits the window.
pub(crate) fn fit(image: &Raster, out_width: usize, out_height: usize) -> (usize, usize) {
    if (image.width, image.height) == (out_width, out_height) {
        return (out_width, out_height);
    }
    let r1 = out_width as f64 / out_height as f64;
    let r2 = image.width as f64 / image.height as f64;
    if r1 > r2 {
        ((out_height as f64 * r2) as usize, out_height)
    } else {
        (out_width, (out_width as f64 / r2) as usize)
    }
}

/// Encode `image` centred in the window at its fitted size.
pub(crate) fn draw_fitted(
    station: &mut StationSignal,
    image: &Raster,
    fitted: (usize, usize),
    out_size: (usize, usize),
    scrambled: bool,
) {
    let w = ((fitted.0 as f64 * UNDERSCAN_X) as i32).max(1);
    let h = ((fitted.1 as f64 * UNDERSCAN_Y) as i32).max(1);
    let (outw, outh) = (out_size.0 as i32, out_size.1 as i32);

    station.setup_sync(true, scrambled);
    station.load_image(
        image,
        None,
        &Placement {
            x: (outw - w) / 2,
            y: (outh - h) / 2,
            target_width: w,
            target_height: h,
            output_width: outw,
            output_height: outh,
        },
    );
}

/// A single picture shown on every frame.
#[derive(Debug, Clone)]
pub struct ImageSource {
    image: Raster,
    out_size: (usize, usize),
    fitted: (usize, usize),
    scrambled: bool,
}

impl ImageSource {
    /// Show `image` in a window of its own size.
    pub fn new(image: Raster) -> Result<Self, SourceError> {
        check_image(&image)?;
        let size = (image.width, image.height);
        Ok(Self {
            image,
            out_size: size,
            fitted: size,
            scrambled: false,
        })
    }

    pub fn image_size(&self) -> (usize, usize) {
        (self.image.width, self.image.height)
    }

    /// Size the picture is fitted to before underscan.
    pub fn fitted_size(&self) -> (usize, usize) {
        self.fitted
    }

    pub fn set_out_size(&mut self, width: usize, height: usize) -> Result<(), SourceError> {
        check_out_size(width, height)?;
        self.out_size = (width, height);
        self.fitted = fit(&self.image, width, height);
        Ok(())
    }

    /// Replace the sync tip with white so receivers cannot lock.
    pub fn set_scrambled(&mut self, scrambled: bool) {
        self.scrambled = scrambled;
    }

    pub fn update(&self, station: &mut StationSignal) {
        draw_fitted(station, &self.image, self.fitted, self.out_size, self.scrambled);
    }
}
