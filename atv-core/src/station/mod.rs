//! Station signal builder
//!
//! A station is one frame of composite baseband signal, one row per
//! scanline, sampled at four times the colour subcarrier. Callers stamp
//! sync and colorburst, then paint picture content with [`StationSignal::load_image`]
//! or [`StationSignal::draw_solid_block`].

mod encode;

pub use encode::Placement;

use crate::geometry::{
    BLACK_LEVEL, BLANK_LEVEL, BP_START, CB_LEN, CB_LEVEL, CB_START, FP_START, LINES, PIC_START,
    SAMPLES_PER_LINE, SCALE, SIGNAL_LEN, SYNC_LEVEL, SYNC_START, TOP, VISLINES, VIS_LEN, VIS_START,
    WHITE_LEVEL,
};

/// Composite signal for one broadcast frame.
///
/// Holds `LINES + 1` rows; the last row mirrors row 0 so readers can run
/// off the end of the frame without wrapping per sample. Every mutating
/// method refreshes that row before returning.
#[derive(Clone)]
pub struct StationSignal {
    signal: Vec<i8>,
}

impl Default for StationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationSignal")
            .field("lines", &(LINES + 1))
            .field("samples_per_line", &SAMPLES_PER_LINE)
            .finish()
    }
}

impl StationSignal {
    /// Blank (all zero) station.
    pub fn new() -> Self {
        Self {
            signal: vec![0; (LINES + 1) * SAMPLES_PER_LINE],
        }
    }

    /// Whole frame plus the mirrored wrap row.
    pub fn samples(&self) -> &[i8] {
        &self.signal
    }

    /// One scanline (`0..=LINES`).
    pub fn line(&self, line: usize) -> &[i8] {
        &self.signal[line * SAMPLES_PER_LINE..(line + 1) * SAMPLES_PER_LINE]
    }

    fn line_mut(&mut self, line: usize) -> &mut [i8] {
        &mut self.signal[line * SAMPLES_PER_LINE..(line + 1) * SAMPLES_PER_LINE]
    }

    fn refresh_wrap_row(&mut self) {
        let (frame, wrap) = self.signal.split_at_mut(SIGNAL_LEN);
        wrap.copy_from_slice(&frame[..SAMPLES_PER_LINE]);
    }

    /// Stamp blanking, sync and (optionally) colorburst on every line.
    ///
    /// `high_sync_level` replaces the sync tip with white, as scrambled
    /// pay-TV signals did; a receiver cannot lock to it.
    pub fn setup_sync(&mut self, include_colorburst: bool, high_sync_level: bool) {
        let sync_level = if high_sync_level {
            WHITE_LEVEL
        } else {
            SYNC_LEVEL
        } as i8;

        for line in 0..LINES {
            let vsync = (3..7).contains(&line);
            let row = self.line_mut(line);

            if vsync {
                row[SYNC_START..BP_START].fill(BLANK_LEVEL as i8);
                row[BP_START..].fill(sync_level);
            } else {
                row[SYNC_START..BP_START].fill(sync_level);
                row[BP_START..PIC_START].fill(BLANK_LEVEL as i8);
                row[PIC_START..FP_START].fill(BLACK_LEVEL as i8);
                row[FP_START..].fill(BLANK_LEVEL as i8);
            }

            if include_colorburst {
                // 9 cycles of colorburst
                for i in (CB_START..CB_START + CB_LEN).step_by(4 * SCALE) {
                    row[i + 1] = row[i + 1].wrapping_add(CB_LEVEL as i8);
                    row[i + 3] = row[i + 3].wrapping_sub(CB_LEVEL as i8);
                }
            }
        }

        self.refresh_wrap_row();
    }

    /// Fill a block with a repeating 4-sample subcarrier pattern.
    ///
    /// `left`/`right` are sample columns (rounded down to 4-sample groups),
    /// `top`/`bottom` scanlines. Degenerate ranges still paint one group
    /// and one line; anything past the frame edge is dropped.
    pub fn draw_solid(&mut self, left: i32, right: i32, top: i32, bottom: i32, ntsc: [i8; 4]) {
        let left = left / 4;
        let right = (right / 4).max(left + 1);
        let bottom = bottom.max(top + 1);

        let groups = (SAMPLES_PER_LINE / 4) as i32;
        let (x0, x1) = (left.clamp(0, groups), right.clamp(0, groups));
        let (y0, y1) = (top.clamp(0, LINES as i32), bottom.clamp(0, LINES as i32));

        for y in y0..y1 {
            let row = self.line_mut(y as usize);
            for group in row[x0 as usize * 4..x1 as usize * 4].chunks_exact_mut(4) {
                group.copy_from_slice(&ntsc);
            }
        }

        self.refresh_wrap_row();
    }

    /// Fill a block given as fractions of the visible picture.
    ///
    /// `luma` and `chroma` are in IRE, `phase` in degrees relative to the
    /// colorburst.
    pub fn draw_solid_block(
        &mut self,
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        luma: f64,
        chroma: f64,
        phase: f64,
    ) {
        let top = (TOP as f64 + VISLINES as f64 * top) as i32;
        let bottom = (TOP as f64 + VISLINES as f64 * bottom) as i32;
        let left = (VIS_START as f64 + VIS_LEN as f64 * left) as i32;
        let right = (VIS_START as f64 + VIS_LEN as f64 * right) as i32;

        self.draw_solid(left, right, top, bottom, lcp_to_ntsc(luma, chroma, phase));
    }
}

/// Convert luma/chroma/phase to the four subcarrier-phase sample values.
pub fn lcp_to_ntsc(luma: f64, chroma: f64, phase: f64) -> [i8; 4] {
    let mut ntsc = [0i8; 4];
    for (i, out) in ntsc.iter_mut().enumerate() {
        let w = 90.0 * i as f64 + phase;
        let val = luma + chroma * w.to_radians().cos();
        *out = val.clamp(0.0, 127.0) as i8;
    }
    ntsc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_sync_line_structure() {
        let mut st = StationSignal::new();
        st.setup_sync(false, false);

        let row = st.line(20);
        assert_eq!(row[0], SYNC_LEVEL as i8);
        assert_eq!(row[BP_START - 1], SYNC_LEVEL as i8);
        assert_eq!(row[BP_START], BLANK_LEVEL as i8);
        assert_eq!(row[PIC_START], BLACK_LEVEL as i8);
        assert_eq!(row[FP_START - 1], BLACK_LEVEL as i8);
        assert_eq!(row[FP_START], BLANK_LEVEL as i8);

        let vs = st.line(4);
        assert_eq!(vs[0], BLANK_LEVEL as i8);
        assert_eq!(vs[BP_START], SYNC_LEVEL as i8);
        assert_eq!(vs[SAMPLES_PER_LINE - 1], SYNC_LEVEL as i8);
        assert_eq!(st.line(7)[BP_START], BLANK_LEVEL as i8);
    }

    #[test]
    fn test_colorburst_cycles() {
        let mut st = StationSignal::new();
        st.setup_sync(true, false);
        let row = st.line(50);

        let mut cycles = 0;
        for i in (CB_START..CB_START + CB_LEN).step_by(4) {
            assert_eq!(row[i], BLANK_LEVEL as i8);
            assert_eq!(row[i + 1], CB_LEVEL as i8);
            assert_eq!(row[i + 2], BLANK_LEVEL as i8);
            assert_eq!(row[i + 3], -CB_LEVEL as i8);
            cycles += 1;
        }
        assert_eq!(cycles, 9);
        assert_eq!(row[CB_START + CB_LEN + 1], BLANK_LEVEL as i8);
    }

    #[test]
    fn test_high_sync_level() {
        let mut st = StationSignal::new();
        st.setup_sync(true, true);
        assert_eq!(st.line(100)[0], WHITE_LEVEL as i8);
    }

    #[test]
    fn test_wrap_row_tracks_row_zero() {
        let mut st = StationSignal::new();
        st.setup_sync(true, false);
        assert_eq!(st.line(LINES), st.line(0));

        st.draw_solid(0, SAMPLES_PER_LINE as i32, 0, 1, [1, 2, 3, 4]);
        assert_eq!(st.line(LINES)[..4], [1, 2, 3, 4]);
        assert_eq!(st.line(LINES), st.line(0));
    }

    #[test]
    fn test_lcp_to_ntsc() {
        assert_eq!(lcp_to_ntsc(50.0, 0.0, 0.0), [50, 50, 50, 50]);

        // Quadrature samples sit on cos() zero crossings and may truncate down
        let ntsc = lcp_to_ntsc(50.0, 20.0, 0.0);
        assert_eq!((ntsc[0], ntsc[2]), (70, 30));
        assert!((49..=50).contains(&ntsc[1]) && (49..=50).contains(&ntsc[3]));

        // Clamped to the legal range
        assert_eq!(lcp_to_ntsc(120.0, 40.0, 0.0)[0], 127);
        assert_eq!(lcp_to_ntsc(7.0, 40.0, 180.0)[0], 0);
        assert_eq!(lcp_to_ntsc(7.0, 40.0, 180.0)[2], 47);
    }

    #[test]
    fn test_draw_solid_block_region() {
        let mut st = StationSignal::new();
        st.draw_solid_block(0.0, 1.0, 0.0, 0.5, 60.0, 0.0, 0.0);

        let mid = TOP + VISLINES / 4;
        assert_eq!(st.line(mid)[VIS_START + 8], 60);
        assert_eq!(st.line(mid)[VIS_START - 8], 0);
        assert_eq!(st.line(TOP + VISLINES / 2 + 1)[VIS_START + 8], 0);
        assert_eq!(st.line(TOP - 1)[VIS_START + 8], 0);
    }

    #[test]
    fn test_draw_solid_out_of_bounds_is_noop() {
        let mut st = StationSignal::new();
        st.draw_solid(10_000, 20_000, 10, 20, [9, 9, 9, 9]);
        st.draw_solid(0, 100, 500, 600, [9, 9, 9, 9]);
        st.draw_solid(-400, -100, -30, -10, [9, 9, 9, 9]);
        assert!(st.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_draw_solid_degenerate_paints_one_group() {
        let mut st = StationSignal::new();
        st.draw_solid(40, 40, 10, 10, [5, 6, 7, 8]);
        assert_eq!(st.line(10)[40..44], [5, 6, 7, 8]);
        assert_eq!(st.line(10)[44], 0);
        assert_eq!(st.line(11)[40], 0);
    }
}
