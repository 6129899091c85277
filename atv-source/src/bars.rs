//! SMPTE colour bars test pattern

use atv_core::{Placement, Raster, StationSignal};
use tracing::trace;

use crate::error::{check_image, check_out_size, SourceError};

/// Luma, chroma and phase for one bar.
type Lcp = (f64, f64, f64);

/// Top 68% of the screen
const TOP_BARS: [Lcp; 7] = [
    (75.0, 0.0, 0.0),    // gray
    (69.0, 31.0, 167.0), // yellow
    (56.0, 44.0, 283.5), // cyan
    (48.0, 41.0, 240.5), // green
    (36.0, 41.0, 60.5),  // magenta
    (28.0, 44.0, 103.5), // red
    (15.0, 31.0, 347.0), // blue
];

/// Castellations between the bars and the pluge row
const MID_BARS: [Lcp; 7] = [
    (15.0, 31.0, 347.0), // blue
    (7.0, 0.0, 0.0),     // black
    (36.0, 41.0, 60.5),  // magenta
    (7.0, 0.0, 0.0),     // black
    (56.0, 44.0, 283.5), // cyan
    (7.0, 0.0, 0.0),     // black
    (75.0, 0.0, 0.0),    // gray
];

/// Bottom row: left, right, luma, chroma, phase
const BOTTOM_BLOCKS: [(f64, f64, f64, f64, f64); 8] = [
    (0.0, 1.0 / 6.0, 7.0, 40.0, 303.0),          // -I
    (1.0 / 6.0, 2.0 / 6.0, 100.0, 0.0, 0.0),     // white
    (2.0 / 6.0, 3.0 / 6.0, 7.0, 40.0, 33.0),     // +Q
    (3.0 / 6.0, 4.0 / 6.0, 7.0, 0.0, 0.0),       // black
    (12.0 / 18.0, 13.0 / 18.0, 3.0, 0.0, 0.0),   // black -4
    (13.0 / 18.0, 14.0 / 18.0, 7.0, 0.0, 0.0),   // black
    (14.0 / 18.0, 15.0 / 18.0, 11.0, 0.0, 0.0),  // black +4
    (5.0 / 6.0, 1.0, 7.0, 0.0, 0.0),             // black
];

/// Colour bars with an optional logo keyed by its own alpha.
#[derive(Debug, Clone)]
pub struct BarsSource {
    logo: Option<Raster>,
    out_width: usize,
    out_height: usize,
}

impl Default for BarsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl BarsSource {
    pub const DEFAULT_SIZE: (usize, usize) = (320, 240);

    pub fn new() -> Self {
        Self {
            logo: None,
            out_width: Self::DEFAULT_SIZE.0,
            out_height: Self::DEFAULT_SIZE.1,
        }
    }

    /// Overlay `logo` on the bars; pixels with alpha 0 show the bars.
    pub fn with_logo(mut self, logo: Raster) -> Result<Self, SourceError> {
        check_image(&logo)?;
        self.logo = Some(logo);
        Ok(self)
    }

    pub fn set_out_size(&mut self, width: usize, height: usize) -> Result<(), SourceError> {
        check_out_size(width, height)?;
        self.out_width = width;
        self.out_height = height;
        Ok(())
    }

    /// Logo position: centred, 20% down, scaled to the window's aspect.
    fn logo_placement(&self) -> Placement {
        let outw = self.out_width as i32;
        let outh = self.out_height as i32;
        let aspect = outw as f64 / outh as f64;
        let scale = if aspect > 1.0 { 0.35 } else { 0.6 };
        let w2 = (outw as f64 * scale) as i32;
        let h2 = (outh as f64 * scale * aspect) as i32;

        Placement {
            x: (outw - w2) / 2,
            y: (outh as f64 * 0.20) as i32,
            target_width: w2,
            target_height: h2,
            output_width: outw,
            output_height: outh,
        }
    }

    pub fn update(&self, station: &mut StationSignal) {
        station.setup_sync(true, false);

        for (col, (top, mid)) in TOP_BARS.iter().zip(MID_BARS.iter()).enumerate() {
            let left = col as f64 / 7.0;
            let right = (col + 1) as f64 / 7.0;
            station.draw_solid_block(left, right, 0.00, 0.68, top.0, top.1, top.2);
            station.draw_solid_block(left, right, 0.68, 0.75, mid.0, mid.1, mid.2);
        }
        for &(left, right, luma, chroma, phase) in BOTTOM_BLOCKS.iter() {
            station.draw_solid_block(left, right, 0.75, 1.00, luma, chroma, phase);
        }

        if let Some(logo) = &self.logo {
            let placement = self.logo_placement();
            trace!(?placement, "drawing logo");
            station.load_image(logo, Some(logo), &placement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atv_core::geometry::{TOP, VIS_LEN, VIS_START};
    use atv_core::lcp_to_ntsc;

    fn bars_station(source: &BarsSource) -> StationSignal {
        let mut st = StationSignal::new();
        source.update(&mut st);
        st
    }

    /// First sample column inside bar `col` of 7.
    fn bar_column(col: usize) -> usize {
        let left = (VIS_START as f64 + VIS_LEN as f64 * col as f64 / 7.0) as usize;
        (left / 4 + 2) * 4
    }

    #[test]
    fn test_top_bars() {
        let st = bars_station(&BarsSource::new());
        let row = st.line(TOP + 60);
        for (col, &(l, c, p)) in TOP_BARS.iter().enumerate() {
            let x = bar_column(col);
            assert_eq!(row[x..x + 4], lcp_to_ntsc(l, c, p), "bar {}", col);
        }
    }

    #[test]
    fn test_castellation_row() {
        let st = bars_station(&BarsSource::new());
        // 0.68..0.75 of 200 visible lines
        let row = st.line(TOP + 140);
        let x = bar_column(1);
        assert_eq!(row[x..x + 4], [7; 4]);
    }

    #[test]
    fn test_pluge_white_block() {
        let st = bars_station(&BarsSource::new());
        let row = st.line(TOP + 180);
        let x = ((VIS_START as f64 + VIS_LEN as f64 * 1.5 / 6.0) as usize / 4) * 4;
        assert_eq!(row[x..x + 4], [100; 4]);
    }

    #[test]
    fn test_transparent_logo_leaves_bars() {
        let plain = bars_station(&BarsSource::new());
        let logo = Raster::new(16, 16);
        let keyed = bars_station(&BarsSource::new().with_logo(logo).unwrap());
        assert_eq!(plain.samples(), keyed.samples());
    }

    #[test]
    fn test_opaque_logo_draws() {
        let plain = bars_station(&BarsSource::new());
        let logo = Raster::filled(16, 16, [255, 255, 255]);
        let keyed = bars_station(&BarsSource::new().with_logo(logo).unwrap());
        assert_ne!(plain.samples(), keyed.samples());
    }

    #[test]
    fn test_logo_placement() {
        let near = |a: i32, b: i32| (a - b).abs() <= 1;

        // 320x240 is wider than tall: 35% of the width, square on screen
        let p = BarsSource::new().logo_placement();
        assert!(near(p.target_width, 112) && near(p.target_height, 112), "{:?}", p);
        assert!(near(p.x, 104), "{:?}", p);
        assert_eq!(p.y, 48);

        let mut tall = BarsSource::new();
        tall.set_out_size(240, 320).unwrap();
        let p = tall.logo_placement();
        assert!(near(p.target_width, 144) && near(p.target_height, 144), "{:?}", p);
    }

    #[test]
    fn test_rejects_empty_logo() {
        let err = BarsSource::new().with_logo(Raster::new(0, 4)).unwrap_err();
        assert_eq!(err, SourceError::EmptyImage { width: 0, height: 4 });
        assert!(BarsSource::new().set_out_size(0, 10).is_err());
    }
}
