//! RGBA8 raster used for station input images and receiver output.

use crate::error::AtvError;

/// Packed 8-bit RGBA image, row-major.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Raster {
    /// Bytes per pixel
    pub const CHANNELS: usize = 4;

    /// Create a transparent black raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * Self::CHANNELS],
        }
    }

    /// Wrap an existing RGBA buffer, checking its length.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, AtvError> {
        let expected = width * height * Self::CHANNELS;
        if data.len() != expected {
            return Err(AtvError::RasterSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a raster filled with one opaque colour.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut raster = Self::new(width, height);
        for px in raster.data.chunks_exact_mut(Self::CHANNELS) {
            px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        raster
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Row stride in bytes.
    pub fn stride(&self) -> usize {
        self.width * Self::CHANNELS
    }

    /// RGBA value at (x, y). Panics when out of range.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = (y * self.width + x) * Self::CHANNELS;
        self.data[i..i + Self::CHANNELS].copy_from_slice(&rgba);
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.stride();
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// Zero every byte, keeping the size.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Mean of the R, G and B channels over the whole raster (0..255).
    pub fn mean_brightness(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let sum: u64 = self
            .data
            .chunks_exact(Self::CHANNELS)
            .map(|px| px[0] as u64 + px[1] as u64 + px[2] as u64)
            .sum();
        sum as f64 / (self.width * self.height * 3) as f64
    }
}
