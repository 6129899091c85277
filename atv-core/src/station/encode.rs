//! Camera-side encoding of an RGB raster into composite signal.
//!
//! Fixed-point throughout, matching the integer DSP of a broadcast
//! encoder: RGB to raw YIQ in .4 weights, three Butterworth low-pass
//! filters (Y 3.5 MHz, I 1.5 MHz, Q 0.5 MHz), then quadrature modulation.

use super::StationSignal;
use crate::geometry::{BLACK_LEVEL, LINES, PIC_LEN, PIC_START, SAMPLES_PER_LINE, SCALE, TOP, VISLINES};
use crate::raster::Raster;

/// Where a raster lands in the picture, in output-window pixels.
///
/// A target size of 0 means "fill the whole picture" on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub target_width: i32,
    pub target_height: i32,
    pub output_width: i32,
    pub output_height: i32,
}

impl Placement {
    /// Whole picture for a window of the given size.
    pub fn fill(output_width: i32, output_height: i32) -> Self {
        Self {
            x: 0,
            y: 0,
            target_width: 0,
            target_height: 0,
            output_width,
            output_height,
        }
    }
}

/// Lines drawn above and below the visible area.
const Y_OVERSCAN: i32 = 5 * SCALE as i32;

/// 4-pole Y low-pass with an extra zero at 3.5 MHz.
#[derive(Default)]
struct LumaFilter {
    x: [i64; 7],
    y: [i64; 7],
}

impl LumaFilter {
    fn step(&mut self, raw: i64) -> i64 {
        let (x, y) = (&mut self.x, &mut self.y);
        x.copy_within(1.., 0);
        x[6] = (raw * 1897) >> 16;
        y.copy_within(1.., 0);
        y[6] = (x[0] + x[6])
            + 4 * (x[1] + x[5])
            + 7 * (x[2] + x[4])
            + 8 * x[3]
            + ((-151 * y[2] + 8115 * y[3] - 38312 * y[4] + 36586 * y[5]) >> 16);
        y[6]
    }
}

/// 3-pole chroma low-pass; coefficients select the I or Q band.
struct ChromaFilter {
    gain: i64,
    poles: [i64; 3],
    shift: u32,
    x: [i64; 4],
    y: [i64; 4],
}

impl ChromaFilter {
    /// 1.5 MHz
    fn in_phase() -> Self {
        Self {
            gain: 1413,
            poles: [16559, -72008, 109682],
            shift: 16,
            x: [0; 4],
            y: [0; 4],
        }
    }

    /// 0.5 MHz
    fn quadrature() -> Self {
        Self {
            gain: 75,
            poles: [2612, -9007, 10453],
            shift: 12,
            x: [0; 4],
            y: [0; 4],
        }
    }

    fn step(&mut self, raw: i64) -> i64 {
        let (x, y, p) = (&mut self.x, &mut self.y, &self.poles);
        x.copy_within(1.., 0);
        x[3] = (raw * self.gain) >> 16;
        y.copy_within(1.., 0);
        y[3] = (x[0] + x[3]) + 3 * (x[1] + x[2])
            + ((p[0] * y[0] + p[1] * y[1] + p[2] * y[2]) >> self.shift);
        y[3]
    }
}

/// 8-bit channel widened to 16 bits the way X11 colour values are.
#[inline]
fn wide(c: u8) -> i64 {
    c as i64 * 257
}

impl StationSignal {
    /// Encode `image` into the picture area.
    ///
    /// Columns are sampled nearest-neighbour, rows blend two source rows.
    /// When `mask` is given, samples whose mask alpha is 0 are skipped and
    /// the filters do not advance over them. Anything landing outside the
    /// frame is dropped.
    ///
    /// # Panics
    ///
    /// If `image` is empty, `mask` differs in size, or the output size in
    /// `placement` is not positive.
    pub fn load_image(&mut self, image: &Raster, mask: Option<&Raster>, placement: &Placement) {
        assert!(!image.is_empty(), "station image must not be empty");
        assert!(
            placement.output_width > 0 && placement.output_height > 0,
            "output size must be positive"
        );
        if let Some(mask) = mask {
            assert_eq!(
                (mask.width, mask.height),
                (image.width, image.height),
                "mask must match image size"
            );
        }

        let out_w = placement.output_width as i64;
        let out_h = placement.output_height as i64;

        let mut x_length = PIC_LEN as i64;
        let mut y_scanlength = (VISLINES as i32 + 2 * Y_OVERSCAN) as i64;
        if placement.target_width > 0 {
            x_length = x_length * placement.target_width as i64 / out_w;
        }
        if placement.target_height > 0 {
            y_scanlength = y_scanlength * placement.target_height as i64 / out_h;
        }
        if x_length <= 0 || y_scanlength <= 0 {
            return;
        }

        let xoff = PIC_LEN as i64 * placement.x as i64 / out_w;
        let yoff = VISLINES as i64 * placement.y as i64 / out_h;

        let img_w = image.width as i64;
        let img_h = image.height as i64;

        let multiq: Vec<i64> = (0..x_length + 4)
            .map(|i| {
                let phase = 90.0 - 90.0 * i as f64;
                (-(phase - 303.0).to_radians().cos() * 4096.0) as i64
            })
            .collect();

        // Source column per sample, shared by every row
        let picx: Vec<usize> = (0..x_length)
            .map(|x| ((x * img_w) / x_length) as usize)
            .collect();

        for y in 0..y_scanlength {
            let row = y - Y_OVERSCAN as i64 + TOP as i64 + yoff;
            if row < 0 || row >= LINES as i64 {
                continue;
            }

            let picy1 = ((y * img_h) / y_scanlength) as usize;
            let picy2 = (((y * img_h + y_scanlength / 2) / y_scanlength) as usize)
                .min(image.height - 1);
            let row1 = image.row(picy1);
            let row2 = image.row(picy2);
            let mask_row = mask.map(|m| m.row(picy1));

            let mut fy = LumaFilter::default();
            let mut fi = ChromaFilter::in_phase();
            let mut fq = ChromaFilter::quadrature();

            let base = row as usize * SAMPLES_PER_LINE;
            for x in 0..x_length as usize {
                let px = picx[x] * Raster::CHANNELS;
                if let Some(m) = mask_row {
                    if m[px + 3] == 0 {
                        continue;
                    }
                }

                let (r1, g1, b1) = (wide(row1[px]), wide(row1[px + 1]), wide(row1[px + 2]));
                let (r2, g2, b2) = (wide(row2[px]), wide(row2[px + 1]), wide(row2[px + 2]));

                // y=0.30r+0.59g+0.11b, i=0.60r-0.28g-0.32b, q=0.21r-0.52g+0.31b in .4 format
                let rawy = (5 * r1 + 11 * g1 + 2 * b1 + 5 * r2 + 11 * g2 + 2 * b2) >> 7;
                let rawi = (10 * r1 - 4 * g1 - 5 * b1 + 10 * r2 - 4 * g2 - 5 * b2) >> 7;
                let rawq = (3 * r1 - 8 * g1 + 5 * b1 + 3 * r2 - 8 * g2 + 5 * b2) >> 7;

                let filty = fy.step(rawy);
                let filti = fi.step(rawi);
                let filtq = fq.step(rawq);

                let mut composite = filty + ((multiq[x] * filti + multiq[x + 3] * filtq) >> 12);
                composite = ((composite * 100) >> 14) + BLACK_LEVEL as i64;
                let composite = composite.clamp(0, 125);

                let col = x as i64 + PIC_START as i64 + xoff;
                if (0..SAMPLES_PER_LINE as i64).contains(&col) {
                    self.signal[base + col as usize] = composite as i8;
                }
            }
        }

        self.refresh_wrap_row();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture_mean(st: &StationSignal, line: usize, from: usize, to: usize) -> f64 {
        let row = st.line(line);
        row[from..to].iter().map(|&s| s as f64).sum::<f64>() / (to - from) as f64
    }

    #[test]
    fn test_white_and_black_levels() {
        let mut st = StationSignal::new();
        st.load_image(&Raster::filled(4, 4, [255, 255, 255]), None, &Placement::fill(64, 64));
        let mid = TOP + VISLINES / 2;
        let white = picture_mean(&st, mid, PIC_START + 100, PIC_START + 600);
        // 16-bit white runs a little hot and clips at 125
        assert!((115.0..=125.0).contains(&white), "white {}", white);

        let mut st = StationSignal::new();
        st.load_image(&Raster::filled(4, 4, [0, 0, 0]), None, &Placement::fill(64, 64));
        assert_eq!(st.line(mid)[PIC_START + 300], BLACK_LEVEL as i8);
    }

    #[test]
    fn test_gray_has_little_subcarrier() {
        let mut st = StationSignal::new();
        st.load_image(&Raster::filled(2, 2, [128, 128, 128]), None, &Placement::fill(64, 64));
        let row = st.line(TOP + 50);
        let s = &row[PIC_START + 200..PIC_START + 204];
        let spread = s.iter().max().unwrap() - s.iter().min().unwrap();
        assert!(spread <= 8, "{:?}", s);
    }

    #[test]
    fn test_red_modulates_chroma() {
        let mut st = StationSignal::new();
        st.load_image(&Raster::filled(2, 2, [255, 0, 0]), None, &Placement::fill(64, 64));
        let row = st.line(TOP + 100);
        let s = &row[PIC_START + 300..PIC_START + 304];
        let spread = s.iter().max().unwrap() - s.iter().min().unwrap();
        assert!(spread > 60, "{:?}", s);
    }

    #[test]
    fn test_mask_skips_transparent_pixels() {
        let mut st = StationSignal::new();
        st.setup_sync(true, false);
        let before = st.samples().to_vec();

        let image = Raster::filled(2, 2, [255, 255, 255]);
        let mask = Raster::new(2, 2);
        st.load_image(&image, Some(&mask), &Placement::fill(64, 64));
        assert_eq!(st.samples(), &before[..]);
    }

    #[test]
    fn test_placement_offscreen_draws_nothing() {
        let mut st = StationSignal::new();
        let placement = Placement {
            x: 0,
            y: 10_000,
            target_width: 32,
            target_height: 32,
            output_width: 64,
            output_height: 64,
        };
        st.load_image(&Raster::filled(2, 2, [255, 255, 255]), None, &placement);
        assert!(st.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_placement_scales_and_offsets() {
        let mut st = StationSignal::new();
        let placement = Placement {
            x: 32,
            y: 32,
            target_width: 16,
            target_height: 16,
            output_width: 64,
            output_height: 64,
        };
        st.load_image(&Raster::filled(2, 2, [255, 255, 255]), None, &placement);

        // x: 755*32/64 = 377 samples in, 755*16/64 = 188 wide
        let first_col = PIC_START + 377;
        let row = TOP + 100 + 20;
        assert_eq!(st.line(row)[first_col - 1], 0);
        assert!(st.line(row)[first_col + 100] > 90);
        assert_eq!(st.line(row)[first_col + 188], 0);
        // Rows above the block remain untouched
        assert!(st.line(TOP + 90).iter().all(|&s| s == 0));
    }

    #[test]
    #[should_panic]
    fn test_empty_image_panics() {
        let mut st = StationSignal::new();
        st.load_image(&Raster::new(0, 0), None, &Placement::fill(64, 64));
    }
}
