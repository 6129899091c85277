//! Output geometry and the per-line brightness level table.

use crate::geometry::{MAX_LINE_HEIGHT, MIN_HEIGHT, MIN_WIDTH, VISLINES};

/// Size of the receiver's scratch image for a given output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Layout {
    pub use_width: usize,
    pub use_height: usize,
    /// Horizontal pixel replication (1 or 2)
    pub xrepl: usize,
    /// Rendered samples per row before replication
    pub subwidth: usize,
}

impl Layout {
    const ASPECT_SLACK: f64 = 0.15;
    const CRAZY_RATIO: f64 = 10.0;
    const HEIGHT_SNAP: f64 = 0.025;

    /// Pick the scratch image size for an output of `width` x `height`.
    ///
    /// Never smaller than 266x200. Ratios close to 4:3 or 16:9 fill the
    /// output exactly, as do absurd ones; everything else is letterboxed
    /// or pillarboxed. Heights within 2.5% of a multiple of the visible
    /// line count snap to it (1024 becomes 1000).
    pub fn for_output(width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            return Self::default();
        }

        let min_ratio = 4.0 / 3.0 * (1.0 - Self::ASPECT_SLACK);
        let max_ratio = 16.0 / 9.0 * (1.0 + Self::ASPECT_SLACK);
        let ratio = width as f64 / height as f64;

        let (mut wlim, mut hlim) = (width as i64, height as i64);
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            wlim = MIN_WIDTH as i64;
            hlim = MIN_HEIGHT as i64;
        } else if ratio > Self::CRAZY_RATIO || ratio < 1.0 / Self::CRAZY_RATIO {
            // Fill as-is
        } else if ratio > min_ratio && ratio < max_ratio {
            // Close enough
        } else if ratio >= max_ratio {
            wlim = (hlim as f64 * max_ratio) as i64;
        } else {
            hlim = (wlim as f64 / min_ratio) as i64;
        }

        let vis = VISLINES as i64;
        let height_diff = ((hlim + vis / 2) % vis) - vis / 2;
        if height_diff != 0 && (height_diff.abs() as f64) < hlim as f64 * Self::HEIGHT_SNAP {
            hlim -= height_diff;
        }

        let use_width = wlim as usize;
        let use_height = hlim as usize;
        let xrepl = (1 + use_width / 640).min(2);
        Self {
            use_width,
            use_height,
            xrepl,
            subwidth: use_width / xrepl,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.use_width == 0 || self.use_height == 0
    }
}

/// One destination row within a scanline's vertical span.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelEntry {
    /// 0 = outer edge, 1 = inner edge, 2 = body
    pub index: usize,
    pub value: f32,
}

/// Brightness per row for scanlines spanning 0..=12 output rows.
///
/// Edge rows of tall scanlines are dimmer so a line's total energy stays
/// near the single-row reference when the output height is not a
/// multiple of the visible line count.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTable {
    entries: [[LevelEntry; MAX_LINE_HEIGHT + 1]; MAX_LINE_HEIGHT + 1],
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            entries: [[LevelEntry::default(); MAX_LINE_HEIGHT + 1]; MAX_LINE_HEIGHT + 1],
        }
    }
}

impl LevelTable {
    const LEVEL_FAC: [f64; 3] = [-7.5, 5.5, 24.5];

    /// Rebuild for an average scanline height of `avg_height` rows.
    ///
    /// `ramp` scales the contrast between levels during power-up.
    pub fn setup(&mut self, avg_height: f64, ramp: f64) {
        for height in 0..=MAX_LINE_HEIGHT {
            let row = &mut self.entries[height];
            for entry in row.iter_mut() {
                entry.index = 2;
            }
            if height == 0 {
                continue;
            }

            if avg_height >= 3.0 {
                row[0].index = 0;
            }
            if avg_height >= 5.0 {
                row[height - 1].index = 0;
            }
            if avg_height >= 7.0 {
                if height >= 2 {
                    row[1].index = 1;
                    row[height - 2].index = 1;
                }
            }

            for entry in row.iter_mut() {
                entry.value = ((40.0 + Self::LEVEL_FAC[entry.index] * ramp) / 256.0) as f32;
            }
        }
    }

    /// Entry for row `row` of a scanline `height` rows tall.
    pub fn get(&self, height: usize, row: usize) -> LevelEntry {
        self.entries[height.min(MAX_LINE_HEIGHT)][row.min(MAX_LINE_HEIGHT)]
    }

    /// Weight of a fully lit body row.
    pub fn full_value(ramp: f64) -> f32 {
        ((40.0 + Self::LEVEL_FAC[2] * ramp) / 256.0) as f32
    }
}
